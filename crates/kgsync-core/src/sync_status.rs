//! Backend-owned sync status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Response of `GET /sync/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// RFC 3339 time of the last full sync; epoch milliseconds are converted
    #[serde(default, deserialize_with = "timestamp_string")]
    pub last_full_sync: Option<String>,

    #[serde(default)]
    pub hours_since_sync: Option<f64>,

    #[serde(default)]
    pub node_count: u64,

    #[serde(default)]
    pub reference_count: u64,

    #[serde(default)]
    pub full_sync_needed: bool,
}

impl SyncStatus {
    /// Human-readable status message for the status command
    pub fn describe(&self) -> String {
        let last_sync = match (&self.last_full_sync, self.hours_since_sync) {
            (Some(at), Some(hours)) => format!("{at} ({hours:.1} hours ago)"),
            (Some(at), None) => at.clone(),
            (None, _) => "never".to_string(),
        };

        format!(
            "Knowledge graph sync status\n\
             Last full sync: {last_sync}\n\
             Nodes: {}\n\
             References: {}\n\
             Full sync needed: {}",
            self.node_count,
            self.reference_count,
            if self.full_sync_needed { "yes" } else { "no" },
        )
    }
}

fn timestamp_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339()),
        _ => None,
    })
}
