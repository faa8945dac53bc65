//! Test doubles
//!
//! [`RecordingBackend`] is an in-memory [`GraphBackend`] that records every
//! envelope it receives. It can simulate an unreachable backend and failing
//! sends, and counts every call for test assertions.

use crate::backend::GraphBackend;
use crate::envelope::{Envelope, PayloadType};
use crate::records::{BlockRecord, PageRecord};
use crate::sync_status::SyncStatus;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct RecordingState {
    available: bool,
    status: Option<SyncStatus>,
    /// Zero-based indexes of `send` calls that fail
    failing_sends: HashSet<usize>,
    send_calls: usize,
    sent: Vec<Envelope>,
    diagnostics: Vec<(String, Value)>,
    availability_checks: usize,
    status_queries: usize,
    timestamp_updates: usize,
}

/// Recording [`GraphBackend`]
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    state: Arc<Mutex<RecordingState>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// Available backend whose status asks for a full sync
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RecordingState {
                available: true,
                status: Some(SyncStatus {
                    full_sync_needed: true,
                    ..Default::default()
                }),
                ..Default::default()
            })),
        }
    }

    /// Backend that fails the availability probe
    pub fn unavailable() -> Self {
        let backend = Self::new();
        backend.set_available(false);
        backend
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().available = available;
    }

    pub fn set_status(&self, status: Option<SyncStatus>) {
        self.state.lock().unwrap().status = status;
    }

    /// Make the `index`-th `send` call (zero-based) fail
    pub fn fail_send(&self, index: usize) {
        self.state.lock().unwrap().failing_sends.insert(index);
    }

    /// Every accepted envelope, in send order
    pub fn sent(&self) -> Vec<Envelope> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_of_type(&self, payload_type: PayloadType) -> Vec<Envelope> {
        self.sent()
            .into_iter()
            .filter(|e| e.payload_type == payload_type)
            .collect()
    }

    /// Decoded block batches, in send order
    pub fn block_batches(&self) -> Vec<Vec<BlockRecord>> {
        self.sent_of_type(PayloadType::BlockBatch)
            .iter()
            .map(|e| e.decode_payload().unwrap())
            .collect()
    }

    /// Decoded page batches, in send order
    pub fn page_batches(&self) -> Vec<Vec<PageRecord>> {
        self.sent_of_type(PayloadType::PageBatch)
            .iter()
            .map(|e| e.decode_payload().unwrap())
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().diagnostics.clone()
    }

    pub fn send_calls(&self) -> usize {
        self.state.lock().unwrap().send_calls
    }

    pub fn availability_checks(&self) -> usize {
        self.state.lock().unwrap().availability_checks
    }

    pub fn status_queries(&self) -> usize {
        self.state.lock().unwrap().status_queries
    }

    pub fn timestamp_updates(&self) -> usize {
        self.state.lock().unwrap().timestamp_updates
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.sent.clear();
        state.diagnostics.clear();
        state.send_calls = 0;
        state.availability_checks = 0;
        state.status_queries = 0;
        state.timestamp_updates = 0;
    }
}

#[async_trait]
impl GraphBackend for RecordingBackend {
    async fn is_available(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.availability_checks += 1;
        state.available
    }

    async fn send(&self, envelope: &Envelope) -> bool {
        let mut state = self.state.lock().unwrap();
        let index = state.send_calls;
        state.send_calls += 1;

        if !state.available || state.failing_sends.contains(&index) {
            return false;
        }
        state.sent.push(envelope.clone());
        true
    }

    async fn sync_status(&self) -> Option<SyncStatus> {
        let mut state = self.state.lock().unwrap();
        state.status_queries += 1;
        if !state.available {
            return None;
        }
        state.status.clone()
    }

    async fn update_sync_timestamp(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if !state.available {
            return false;
        }
        state.timestamp_updates += 1;
        if let Some(status) = state.status.as_mut() {
            status.full_sync_needed = false;
        }
        true
    }

    async fn send_diagnostic(&self, _graph_name: &str, message: &str, details: Value) {
        let mut state = self.state.lock().unwrap();
        if state.available {
            state.diagnostics.push((message.to_string(), details));
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
