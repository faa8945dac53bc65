//! # kgsync configuration
//!
//! Typed configuration for the sync client: where the backend lives, how
//! records are batched, and how verbose logging is.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kgsync_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load(None)?;
//! println!("backend at {}", config.backend.base_url());
//! # Ok::<(), kgsync_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
mod error;
mod loader;

pub use components::{BackendConfig, KgsyncConfig, LoggingConfig, SyncConfig};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, CONFIG_FILE_NAMES};
