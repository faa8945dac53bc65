//! Backend connection configuration

use serde::{Deserialize, Serialize};

/// Where the graph backend lives and how envelopes are labelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Host of the local backend
    pub host: String,
    /// Port of the local backend
    pub port: u16,
    /// Full base URL; takes precedence over `host` and `port`
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// `source` field stamped on every envelope
    pub source: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_url: None,
            timeout_secs: 30,
            source: "PKM Knowledge Graph Plugin".to_string(),
        }
    }
}

impl BackendConfig {
    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        assert_eq!(BackendConfig::default().base_url(), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let config = BackendConfig {
            base_url: Some("http://graph.local:9000/".to_string()),
            port: 1,
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://graph.local:9000");
    }
}
