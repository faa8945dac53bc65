//! Graph backend seam

use crate::envelope::Envelope;
use crate::sync_status::SyncStatus;
use async_trait::async_trait;
use serde_json::Value;

/// Remote graph backend as seen by the sync engine
///
/// Every operation may suspend on network I/O. None of them return errors:
/// implementations log the underlying cause and report failure as `false` /
/// `None`, so a backend problem never escapes the current sync session.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// `GET /` answered with a success status
    async fn is_available(&self) -> bool;

    /// `POST /data`; `true` on a 2xx response
    async fn send(&self, envelope: &Envelope) -> bool;

    /// `GET /sync/status`; `None` when it could not be obtained
    async fn sync_status(&self) -> Option<SyncStatus>;

    /// `POST /sync/update`; marks now as the last full sync
    async fn update_sync_timestamp(&self) -> bool;

    /// Send a `diagnostic` envelope. Failures are logged only.
    async fn send_diagnostic(&self, graph_name: &str, message: &str, details: Value);

    /// Name used in logs
    fn name(&self) -> &'static str {
        "graph-backend"
    }
}
