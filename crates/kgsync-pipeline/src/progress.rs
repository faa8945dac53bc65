//! Session progress published over a `watch` channel

use crate::engine::SyncState;
use serde::Serialize;

/// What the running session is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Idle,
    CheckingBackend,
    ListingPages,
    SyncingPages,
    Incremental,
    Finishing,
}

/// Snapshot of the current session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncProgress {
    pub state: SyncState,
    pub phase: SyncPhase,
    pub pages_total: usize,
    pub pages_done: usize,
    pub blocks_sent: usize,
    pub pages_sent: usize,
    pub failed_batches: usize,
}

impl SyncProgress {
    /// Completed pages as a fraction of the total, `0.0` before listing
    pub fn fraction(&self) -> f64 {
        if self.pages_total == 0 {
            0.0
        } else {
            self.pages_done as f64 / self.pages_total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let mut progress = SyncProgress::default();
        assert_eq!(progress.fraction(), 0.0);

        progress.pages_total = 4;
        progress.pages_done = 1;
        assert_eq!(progress.fraction(), 0.25);
    }
}
