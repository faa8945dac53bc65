//! Configuration components
//!
//! Each section of the config file maps onto one component struct. Every
//! component has a `Default` so a missing section, or a missing file, still
//! yields a usable configuration.

pub mod backend;
pub mod logging;
pub mod sync;

pub use backend::*;
pub use logging::*;
pub use sync::*;

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KgsyncConfig {
    /// Backend connection
    pub backend: BackendConfig,
    /// Batching and sync triggers
    pub sync: SyncConfig,
    /// Log output
    pub logging: LoggingConfig,
}
