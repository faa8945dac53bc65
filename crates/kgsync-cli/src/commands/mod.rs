//! Subcommand implementations

pub mod ping;
pub mod refs;
pub mod replay;
pub mod status;
pub mod sync;

use anyhow::{Context, Result};
use kgsync_client::HttpBackendClient;
use kgsync_config::KgsyncConfig;
use kgsync_core::InMemoryContentStore;
use kgsync_pipeline::{SyncOutcome, SyncReport};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

pub(crate) fn backend(config: &KgsyncConfig) -> Result<HttpBackendClient> {
    HttpBackendClient::new(&config.backend).context("Failed to create backend client")
}

pub(crate) async fn load_snapshot(path: &Path) -> Result<Arc<InMemoryContentStore>> {
    let store = InMemoryContentStore::load(path)
        .await
        .with_context(|| format!("Failed to load graph snapshot '{}'", path.display()))?;
    Ok(Arc::new(store))
}

/// One-paragraph summary of a session report
pub fn format_report(report: &SyncReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Sent {} pages and {} blocks in {} batches",
        report.pages_sent, report.blocks_sent, report.batches_sent
    );
    if report.pages_filtered > 0 {
        let _ = writeln!(out, "Skipped {} old journal pages", report.pages_filtered);
    }
    if report.blocks_skipped > 0 {
        let _ = writeln!(out, "Skipped {} empty blocks", report.blocks_skipped);
    }
    if report.failed_batches > 0 {
        let _ = writeln!(out, "{} batches were not accepted", report.failed_batches);
    }
    if !report.issues.is_empty() {
        let _ = write!(out, "{}", report.issues);
    }
    out
}

/// Turn a session outcome into CLI output, failing on `Failed`
pub(crate) fn finish(outcome: SyncOutcome) -> Result<()> {
    match outcome {
        SyncOutcome::Skipped => {
            println!("Nothing to sync");
            Ok(())
        }
        SyncOutcome::Completed(report) => {
            print!("{}", format_report(&report));
            Ok(())
        }
        SyncOutcome::Failed(failure) => Err(anyhow::Error::new(failure).context("Sync failed")),
    }
}
