//! Feed recorded host notifications through the sync engine

use super::{backend, format_report, load_snapshot};
use anyhow::{bail, Context, Result};
use kgsync_config::KgsyncConfig;
use kgsync_core::{ChangeEvent, RouteChange};
use kgsync_pipeline::{SyncEngine, SyncOutcome, SyncSettings};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// One line of an events file
///
/// `{"route": "/page/Notes"}` is a navigation; anything else is read as a
/// change event `{"blocks": [...], "pages": [...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReplayEvent {
    Route { route: String },
    Change(ChangeEvent),
}

/// Parse JSON lines, skipping blank ones
pub fn parse_events(contents: &str) -> Result<Vec<ReplayEvent>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid event on line {}", index + 1))
        })
        .collect()
}

pub async fn execute(config: KgsyncConfig, snapshot: &Path, events: &Path) -> Result<()> {
    let contents = tokio::fs::read_to_string(events)
        .await
        .with_context(|| format!("Failed to read events file '{}'", events.display()))?;
    let events = parse_events(&contents)?;

    let store = load_snapshot(snapshot).await?;
    let client = Arc::new(backend(&config)?);
    let mut engine = SyncEngine::new(store, client, SyncSettings::from_config(&config));

    let (mut completed, mut skipped, mut failed) = (0, 0, 0);
    for (index, event) in events.into_iter().enumerate() {
        let outcome = match event {
            ReplayEvent::Route { route } => {
                engine
                    .handle_route_change(&RouteChange { path: route })
                    .await
            }
            ReplayEvent::Change(change) => engine.handle_change(change).await,
        };

        match outcome {
            SyncOutcome::Completed(report) => {
                completed += 1;
                info!(event = index + 1, "{}", format_report(&report).trim_end());
            }
            SyncOutcome::Skipped => skipped += 1,
            SyncOutcome::Failed(failure) => {
                failed += 1;
                warn!(event = index + 1, "Event failed: {}", failure);
            }
        }
    }

    println!("Replayed {completed} events ({skipped} skipped, {failed} failed)");
    if failed > 0 {
        bail!("{failed} events failed");
    }
    Ok(())
}
