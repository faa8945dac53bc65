//! Configuration discovery and loading
//!
//! Precedence, lowest first: defaults, config file, environment. Callers
//! apply command line flags on top of the returned value.
//!
//! The file is the first of:
//! 1. an explicit path
//! 2. `config.toml`, `config.yaml` or `config.yml` in the start directory or
//!    up to three of its parents
//! 3. `<user config dir>/kgsync/config.toml`

use crate::components::KgsyncConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File names probed during discovery, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["config.toml", "config.yaml", "config.yml"];

const MAX_PARENT_DEPTH: usize = 3;

const ENV_BACKEND_URL: &str = "KGSYNC_BACKEND_URL";
const ENV_BACKEND_HOST: &str = "KGSYNC_BACKEND_HOST";
const ENV_BACKEND_PORT: &str = "KGSYNC_BACKEND_PORT";
const ENV_LOG_LEVEL: &str = "KGSYNC_LOG_LEVEL";

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
}

impl ConfigFormat {
    /// Format implied by the file extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Parse `content` in this format
    pub fn parse(self, content: &str, path: &Path) -> ConfigResult<KgsyncConfig> {
        let parsed = match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => {
                if content.trim().is_empty() {
                    return Ok(KgsyncConfig::default());
                }
                serde_yaml::from_str(content).map_err(|e| e.to_string())
            }
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Locates and loads [`KgsyncConfig`]
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    start_dir: Option<PathBuf>,
    user_config_dir: Option<PathBuf>,
    use_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader rooted at the current directory and the platform config dir
    pub fn new() -> Self {
        Self {
            start_dir: std::env::current_dir().ok(),
            user_config_dir: dirs::config_dir().map(|dir| dir.join("kgsync")),
            use_env: true,
        }
    }

    /// Start discovery from `dir` instead of the current directory
    pub fn with_start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start_dir = Some(dir.into());
        self
    }

    /// Replace the per-user config directory; `None` disables it
    pub fn with_user_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_config_dir = dir;
        self
    }

    /// Skip environment overrides
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load, apply environment overrides and validate
    pub fn load(&self, explicit: Option<&Path>) -> ConfigResult<KgsyncConfig> {
        let mut config = match self.locate(explicit) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No config file found, using defaults");
                KgsyncConfig::default()
            }
        };

        if self.use_env {
            apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Path of the file [`load`](Self::load) would read
    pub fn locate(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Some(start) = &self.start_dir {
            for dir in start.ancestors().take(MAX_PARENT_DEPTH + 1) {
                for name in CONFIG_FILE_NAMES {
                    let candidate = dir.join(name);
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                }
            }
        }

        self.user_config_dir
            .as_ref()
            .map(|dir| dir.join("config.toml"))
            .filter(|path| path.is_file())
    }

    /// Read and parse a single file
    pub fn from_file(path: &Path) -> ConfigResult<KgsyncConfig> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        format.parse(&content, path)
    }
}

/// Apply `KGSYNC_*` overrides read through `lookup`
pub(crate) fn apply_env_overrides<F>(config: &mut KgsyncConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_BACKEND_URL) {
        config.backend.base_url = Some(url);
    }
    if let Some(host) = lookup(ENV_BACKEND_HOST) {
        config.backend.host = host;
    }
    if let Some(port) = lookup(ENV_BACKEND_PORT) {
        config.backend.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
            var: ENV_BACKEND_PORT,
            value: port.clone(),
        })?;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    Ok(())
}

impl KgsyncConfig {
    /// Reject values the sync engine cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend.base_url.is_none() && self.backend.port == 0 {
            return Err(ConfigError::Invalid("backend.port must be non-zero".into()));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_secs must be non-zero".into(),
            ));
        }
        if self.sync.full_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "sync.full_batch_size must be non-zero".into(),
            ));
        }
        if self.sync.incremental_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "sync.incremental_batch_size must be non-zero".into(),
            ));
        }
        if self.sync.journal_window_days < 0 {
            return Err(ConfigError::Invalid(
                "sync.journal_window_days must not be negative".into(),
            ));
        }
        Ok(())
    }
}
