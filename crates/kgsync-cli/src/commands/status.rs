use super::backend;
use anyhow::{anyhow, Result};
use kgsync_config::KgsyncConfig;
use kgsync_core::GraphBackend;

pub async fn execute(config: KgsyncConfig) -> Result<()> {
    let client = backend(&config)?;
    let status = client
        .sync_status()
        .await
        .ok_or_else(|| anyhow!("Could not fetch sync status from {}", client.base_url()))?;
    println!("{}", status.describe());
    Ok(())
}
