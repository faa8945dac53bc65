//! tracing subscriber setup

use crate::cli::{Cli, LogLevel};
use tracing_subscriber::EnvFilter;

/// Filter directive: `--log-level`, then `--verbose`, then the config value
pub fn filter_directive(cli: &Cli, configured: &str) -> String {
    match (cli.log_level, cli.verbose) {
        (Some(level), _) => level.as_directive().to_string(),
        (None, true) => LogLevel::Debug.as_directive().to_string(),
        (None, false) => configured.to_string(),
    }
}

/// Install the global fmt subscriber
pub fn init(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
