use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl LogLevel {
    /// Lower-case `EnvFilter` directive
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "kgsync")]
#[command(about = "kgsync - sync a personal knowledge graph to the knowledge graph backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'info'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to config.toml discovery)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config file and environment)
    #[arg(long, global = true)]
    pub backend_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the backend's sync status
    Status,

    /// Check that the backend is reachable
    Ping,

    /// Sync a graph snapshot to the backend
    Sync {
        /// Graph snapshot (JSON export)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Run a full sync even if the backend does not ask for one
        #[arg(long)]
        force: bool,
    },

    /// Replay change events against a graph snapshot
    Replay {
        /// Graph snapshot (JSON export)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Events file, one JSON event per line
        #[arg(short, long)]
        events: PathBuf,
    },

    /// Extract references from text
    Refs {
        /// Text to scan
        text: String,

        /// Also send the references as a test_references payload
        #[arg(long)]
        send: bool,

        /// Graph name stamped on the sent payload
        #[arg(long, default_value = "default")]
        graph: String,
    },
}
