use super::backend;
use anyhow::{bail, Result};
use kgsync_config::KgsyncConfig;
use kgsync_core::GraphBackend;

pub async fn execute(config: KgsyncConfig) -> Result<()> {
    let client = backend(&config)?;
    if !client.is_available().await {
        bail!("Backend at {} is not reachable", client.base_url());
    }
    println!("Backend at {} is reachable", client.base_url());
    Ok(())
}
