//! Sync batching configuration

use serde::{Deserialize, Serialize};

/// Batch sizes and full-sync tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Records per batch during a full sync
    pub full_batch_size: usize,
    /// Records per batch when syncing a change event
    pub incremental_batch_size: usize,
    /// Page count above which journal pages are filtered
    pub large_graph_threshold: usize,
    /// Journal pages older than this many days are skipped on large graphs
    pub journal_window_days: i64,
    /// Sync the target page when the UI route changes to it
    pub sync_on_route_change: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            full_batch_size: 100,
            incremental_batch_size: 20,
            large_graph_threshold: 100,
            journal_window_days: 30,
            sync_on_route_change: true,
        }
    }
}
