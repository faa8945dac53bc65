use super::{backend, finish, load_snapshot};
use anyhow::Result;
use kgsync_config::KgsyncConfig;
use kgsync_pipeline::{SyncEngine, SyncSettings};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub async fn execute(config: KgsyncConfig, snapshot: &Path, force: bool) -> Result<()> {
    let store = load_snapshot(snapshot).await?;
    info!(
        pages = store.page_count(),
        blocks = store.block_count(),
        "Loaded snapshot"
    );

    let client = Arc::new(backend(&config)?);
    let mut engine = SyncEngine::new(store, client, SyncSettings::from_config(&config));

    let outcome = if force {
        engine.full_sync().await
    } else {
        engine.start().await
    };
    finish(outcome)
}
