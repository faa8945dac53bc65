use anyhow::{Context, Result};
use clap::Parser;
use kgsync_cli::cli::{Cli, Commands};
use kgsync_cli::{commands, logging};
use kgsync_config::ConfigLoader;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration: defaults < file < env < args
    let mut config = ConfigLoader::new()
        .load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(url) = &cli.backend_url {
        config.backend.base_url = Some(url.clone());
    }

    logging::init(&logging::filter_directive(&cli, &config.logging.level));
    debug!(backend = %config.backend.base_url(), "Configuration loaded");

    match cli.command {
        Commands::Status => commands::status::execute(config).await,
        Commands::Ping => commands::ping::execute(config).await,
        Commands::Sync { snapshot, force } => {
            commands::sync::execute(config, &snapshot, force).await
        }
        Commands::Replay { snapshot, events } => {
            commands::replay::execute(config, &snapshot, &events).await
        }
        Commands::Refs { text, send, graph } => {
            commands::refs::execute(config, &text, send, &graph).await
        }
    }
}
