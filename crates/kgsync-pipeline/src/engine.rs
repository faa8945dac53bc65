//! Sync session orchestrator
//!
//! [`SyncEngine`] owns the issue tracker and drives every session: startup
//! gating, full sync, change events and route changes. Sessions take
//! `&mut self`, so at most one runs at a time per engine.
//!
//! ```text
//! SyncEngine (orchestration)
//!   ├─> GraphBackend   (availability, status, batches, diagnostics)
//!   ├─> ContentStore   (pages, block trees, lookups)
//!   ├─> RecordNormalizer
//!   ├─> validation     (kgsync_core::validation)
//!   └─> IssueTracker   (owned)
//! ```

use crate::batch::BatchBuffer;
use crate::journal::JournalWindow;
use crate::normalizer::RecordNormalizer;
use crate::progress::{SyncPhase, SyncProgress};
use chrono::{NaiveDate, Utc};
use kgsync_config::KgsyncConfig;
use kgsync_core::{
    validate_block, validate_page, BlockRecord, ChangeEvent, ChildRef, ContentStore, Envelope,
    GraphBackend, IssueSummary, IssueTracker, PageKey, PageRecord, PayloadType, RawBlock,
    RawChild, RawPage, RouteChange, StoreError,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

// ============================================================================
// Session types
// ============================================================================

/// Lifecycle of the engine; every session ends back at `Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Why a session failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncFailure {
    #[error("Knowledge graph backend is not available. Start the backend server and try again.")]
    BackendUnavailable,

    #[error("Content store error: {0}")]
    Store(#[from] StoreError),
}

/// Counters for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    /// Pages returned by the content store
    pub pages_seen: usize,
    /// Journal pages left out by the window filter
    pub pages_filtered: usize,
    pub pages_sent: usize,
    pub blocks_sent: usize,
    /// Blank blocks and blocks whose identifier could not be resolved
    pub blocks_skipped: usize,
    /// Records that failed validation
    pub records_rejected: usize,
    pub batches_sent: usize,
    pub failed_batches: usize,
    pub timestamp_updated: bool,
    pub issues: IssueSummary,
}

/// Result of a session
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Nothing to do
    Skipped,
    Completed(SyncReport),
    Failed(SyncFailure),
}

impl SyncOutcome {
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Engine tuning, usually derived from [`KgsyncConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// `source` stamped on envelopes
    pub source: String,
    pub full_batch_size: usize,
    pub incremental_batch_size: usize,
    pub large_graph_threshold: usize,
    pub journal_window_days: i64,
    pub sync_on_route_change: bool,
}

impl SyncSettings {
    pub fn from_config(config: &KgsyncConfig) -> Self {
        Self {
            source: config.backend.source.clone(),
            full_batch_size: config.sync.full_batch_size,
            incremental_batch_size: config.sync.incremental_batch_size,
            large_graph_threshold: config.sync.large_graph_threshold,
            journal_window_days: config.sync.journal_window_days,
            sync_on_route_change: config.sync.sync_on_route_change,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&KgsyncConfig::default())
    }
}

/// Buffers and counters of the running session
struct Session {
    graph: String,
    pages: BatchBuffer<PageRecord>,
    blocks: BatchBuffer<BlockRecord>,
    report: SyncReport,
}

impl Session {
    fn new(graph: String, batch_size: usize) -> Self {
        Self {
            graph,
            pages: BatchBuffer::new(batch_size),
            blocks: BatchBuffer::new(batch_size),
            report: SyncReport::default(),
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Drives sync sessions against a [`ContentStore`] and a [`GraphBackend`]
pub struct SyncEngine {
    store: Arc<dyn ContentStore>,
    backend: Arc<dyn GraphBackend>,
    normalizer: RecordNormalizer,
    settings: SyncSettings,
    tracker: IssueTracker,
    progress: watch::Sender<SyncProgress>,
    today: Option<NaiveDate>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn ContentStore>,
        backend: Arc<dyn GraphBackend>,
        settings: SyncSettings,
    ) -> Self {
        let (progress, _) = watch::channel(SyncProgress::default());
        Self {
            normalizer: RecordNormalizer::new(Arc::clone(&store)),
            store,
            backend,
            settings,
            tracker: IssueTracker::new(),
            progress,
            today: None,
        }
    }

    /// Pin the day the journal window is measured from
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn state(&self) -> SyncState {
        self.progress.borrow().state
    }

    /// Issues recorded since the last full sync began
    pub fn issues(&self) -> &IssueTracker {
        &self.tracker
    }

    /// Progress updates for the current and future sessions
    pub fn subscribe(&self) -> watch::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    /// Startup gating: full sync only when the backend asks for one
    pub async fn start(&mut self) -> SyncOutcome {
        if let Err(failure) = self.check_backend().await {
            return self.fail(failure);
        }

        match self.backend.sync_status().await {
            Some(status) if !status.full_sync_needed => {
                info!(
                    last_full_sync = ?status.last_full_sync,
                    "Backend is up to date, skipping full sync"
                );
                self.set_idle();
                return SyncOutcome::Skipped;
            }
            Some(_) => info!("Backend requested a full sync"),
            None => warn!("Sync status unavailable, running a full sync"),
        }

        self.full_sync().await
    }

    /// Traverse the whole graph and send every valid record
    pub async fn full_sync(&mut self) -> SyncOutcome {
        if let Err(failure) = self.check_backend().await {
            return self.fail(failure);
        }

        self.tracker.reset();
        let graph = self.graph_name().await;
        let mut session = Session::new(graph, self.settings.full_batch_size);
        info!(graph = %session.graph, "Starting full sync");

        self.set_phase(SyncPhase::ListingPages);
        let pages = match self.store.all_pages().await {
            Ok(pages) => pages,
            Err(e) => return self.fail(e.into()),
        };
        let pages = self.apply_journal_window(pages, &mut session.report);
        let total = pages.len();
        self.progress.send_modify(|p| {
            p.phase = SyncPhase::SyncingPages;
            p.pages_total = total;
        });

        for (index, page) in pages.iter().enumerate() {
            self.sync_page(page, &mut session).await;
            self.progress.send_modify(|p| p.pages_done = index + 1);
            debug!(done = index + 1, total, "Page processed");
        }

        self.set_phase(SyncPhase::Finishing);
        self.flush_remaining(&mut session).await;

        let summary = self.tracker.summary();
        if !summary.is_empty() {
            warn!("{}", summary);
            let details = serde_json::to_value(&summary).unwrap_or_default();
            self.backend
                .send_diagnostic(&session.graph, &summary.to_string(), details)
                .await;
        }

        session.report.timestamp_updated = self.backend.update_sync_timestamp().await;
        if !session.report.timestamp_updated {
            warn!("Backend sync timestamp was not updated");
        }
        session.report.issues = summary;

        self.complete(session)
    }

    /// Sync the entities named in a host change notification
    pub async fn handle_change(&mut self, event: ChangeEvent) -> SyncOutcome {
        if event.is_empty() {
            return SyncOutcome::Skipped;
        }

        if let Err(failure) = self.check_backend().await {
            return self.fail(failure);
        }
        self.set_phase(SyncPhase::Incremental);
        let graph = self.graph_name().await;
        let mut session = Session::new(graph, self.settings.incremental_batch_size);
        debug!(
            blocks = event.blocks.len(),
            pages = event.pages.len(),
            "Handling change event"
        );

        for raw in &event.pages {
            let Some(name) = raw.display_name() else {
                self.normalizer
                    .normalize_page(raw, Vec::new(), &mut self.tracker);
                continue;
            };
            let roots = match self.store.page_blocks_tree(name).await {
                Ok(tree) => root_refs(&tree),
                Err(e) => {
                    warn!(page = %name, "Could not load page blocks, skipping page: {}", e);
                    continue;
                }
            };
            if let Some(page) = self.accept_page(raw, roots, &mut session.report) {
                self.push_page(page, &mut session).await;
            }
        }

        for raw in &event.blocks {
            if let Some(block) = self.accept_block(raw, None, &mut session.report).await {
                self.push_block(block, &mut session).await;
            }
        }

        self.flush_remaining(&mut session).await;
        self.complete(session)
    }

    /// Re-sync the page the user navigated to
    pub async fn handle_route_change(&mut self, route: &RouteChange) -> SyncOutcome {
        if !self.settings.sync_on_route_change {
            return SyncOutcome::Skipped;
        }
        let Some(name) = page_name_from_route(&route.path) else {
            debug!(path = %route.path, "Route is not a page");
            return SyncOutcome::Skipped;
        };

        if let Err(failure) = self.check_backend().await {
            return self.fail(failure);
        }
        self.set_phase(SyncPhase::Incremental);
        let page = match self.store.get_page(&PageKey::Name(name)).await {
            Ok(page) => page,
            Err(e) => return self.fail(e.into()),
        };

        let graph = self.graph_name().await;
        let mut session = Session::new(graph, self.settings.incremental_batch_size);
        self.sync_page(&page, &mut session).await;
        self.flush_remaining(&mut session).await;
        self.complete(session)
    }

    /// Begin a session by probing the backend
    async fn check_backend(&self) -> Result<(), SyncFailure> {
        self.begin(SyncPhase::CheckingBackend);
        if self.backend.is_available().await {
            Ok(())
        } else {
            Err(SyncFailure::BackendUnavailable)
        }
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn apply_journal_window(&self, pages: Vec<RawPage>, report: &mut SyncReport) -> Vec<RawPage> {
        report.pages_seen = pages.len();
        if pages.len() <= self.settings.large_graph_threshold {
            return pages;
        }

        let window = JournalWindow::new(self.today(), self.settings.journal_window_days);
        let kept = window.apply(pages);
        report.pages_filtered = report.pages_seen - kept.len();
        info!(
            pages = report.pages_seen,
            filtered = report.pages_filtered,
            "Large graph, skipping journals before {}",
            window.cutoff()
        );
        kept
    }

    /// Normalize a page and its block tree, then queue page before blocks
    async fn sync_page(&mut self, raw: &RawPage, session: &mut Session) {
        let Some(name) = raw.display_name().map(str::to_string) else {
            self.normalizer
                .normalize_page(raw, Vec::new(), &mut self.tracker);
            return;
        };

        let tree = match self.store.page_blocks_tree(&name).await {
            Ok(tree) => tree,
            Err(e) => {
                warn!(page = %name, "Could not load block tree, skipping page: {}", e);
                return;
            }
        };

        // Depth-first, document order. Each entry carries its nearest accepted
        // ancestor so descendants of dropped blocks attach to a sent record.
        let mut accepted: Vec<BlockRecord> = Vec::new();
        let mut roots: Vec<ChildRef> = Vec::new();
        let mut stack: Vec<(&RawBlock, Option<String>)> =
            tree.iter().rev().map(|b| (b, None)).collect();
        while let Some((raw_block, ancestor)) = stack.pop() {
            let mut nearest = ancestor.clone();
            if let Some(mut record) = self
                .accept_block(raw_block, Some(name.as_str()), &mut session.report)
                .await
            {
                record.parent = ancestor;
                if record.parent.is_none() {
                    roots.push(ChildRef::Id(record.id.clone()));
                }
                nearest = Some(record.id.clone());
                accepted.push(record);
            }
            for child in raw_block.children.iter().rev() {
                if let RawChild::Block(child) = child {
                    stack.push((child.as_ref(), nearest.clone()));
                }
            }
        }
        relink_children(&mut accepted);

        if let Some(page) = self.accept_page(raw, roots, &mut session.report) {
            self.push_page(page, session).await;
        }
        for block in accepted {
            self.push_block(block, session).await;
        }
    }

    async fn accept_block(
        &mut self,
        raw: &RawBlock,
        page_hint: Option<&str>,
        report: &mut SyncReport,
    ) -> Option<BlockRecord> {
        let Some(record) = self.normalizer.normalize_block_in_page(raw, page_hint).await else {
            report.blocks_skipped += 1;
            return None;
        };

        let validation = validate_block(&record);
        if validation.valid {
            return Some(record);
        }
        debug!(id = %record.id, errors = ?validation.errors, "Block rejected");
        self.tracker
            .record_block_issue(&record.id, record.page.as_deref(), &validation.errors);
        report.records_rejected += 1;
        None
    }

    fn accept_page(
        &mut self,
        raw: &RawPage,
        roots: Vec<ChildRef>,
        report: &mut SyncReport,
    ) -> Option<PageRecord> {
        let record = self.normalizer.normalize_page(raw, roots, &mut self.tracker)?;

        let validation = validate_page(&record);
        if validation.valid {
            return Some(record);
        }
        debug!(page = %record.name, errors = ?validation.errors, "Page rejected");
        self.tracker
            .record_page_issue(&record.name, &validation.errors);
        report.records_rejected += 1;
        None
    }

    // ------------------------------------------------------------------------
    // Batching
    // ------------------------------------------------------------------------

    async fn push_page(&self, page: PageRecord, session: &mut Session) {
        if let Some(batch) = session.pages.push(page) {
            self.send_batch(PayloadType::PageBatch, batch, session).await;
        }
    }

    async fn push_block(&self, block: BlockRecord, session: &mut Session) {
        if let Some(batch) = session.blocks.push(block) {
            self.send_batch(PayloadType::BlockBatch, batch, session).await;
        }
    }

    async fn flush_remaining(&self, session: &mut Session) {
        if let Some(batch) = session.pages.take_remaining() {
            self.send_batch(PayloadType::PageBatch, batch, session).await;
        }
        if let Some(batch) = session.blocks.take_remaining() {
            self.send_batch(PayloadType::BlockBatch, batch, session).await;
        }
    }

    async fn send_batch<T: Serialize>(
        &self,
        payload_type: PayloadType,
        batch: Vec<T>,
        session: &mut Session,
    ) {
        let count = batch.len();
        let sent = match Envelope::new(&self.settings.source, &session.graph, payload_type, &batch)
        {
            Ok(envelope) => self.backend.send(&envelope).await,
            Err(e) => {
                error!(%payload_type, "Could not encode batch: {}", e);
                false
            }
        };

        let report = &mut session.report;
        if sent {
            report.batches_sent += 1;
            match payload_type {
                PayloadType::PageBatch => report.pages_sent += count,
                PayloadType::BlockBatch => report.blocks_sent += count,
                _ => {}
            }
            debug!(%payload_type, count, "Batch sent");
        } else {
            report.failed_batches += 1;
            warn!(%payload_type, count, "Batch was not accepted by the backend");
        }

        let (pages_sent, blocks_sent, failed) =
            (report.pages_sent, report.blocks_sent, report.failed_batches);
        self.progress.send_modify(|p| {
            p.pages_sent = pages_sent;
            p.blocks_sent = blocks_sent;
            p.failed_batches = failed;
        });
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    async fn graph_name(&self) -> String {
        match self.store.current_graph().await {
            Ok(graph) => graph.name,
            Err(e) => {
                warn!("Could not determine current graph: {}", e);
                "default".to_string()
            }
        }
    }

    fn begin(&self, phase: SyncPhase) {
        self.progress.send_replace(SyncProgress {
            state: SyncState::Running,
            phase,
            ..Default::default()
        });
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.progress.send_modify(|p| p.phase = phase);
    }

    fn set_idle(&self) {
        self.progress.send_modify(|p| {
            p.state = SyncState::Idle;
            p.phase = SyncPhase::Idle;
        });
    }

    fn complete(&self, session: Session) -> SyncOutcome {
        let report = session.report;
        info!(
            pages = report.pages_sent,
            blocks = report.blocks_sent,
            rejected = report.records_rejected,
            failed_batches = report.failed_batches,
            "Sync completed"
        );
        self.progress.send_modify(|p| p.state = SyncState::Completed);
        self.set_idle();
        SyncOutcome::Completed(report)
    }

    fn fail(&self, failure: SyncFailure) -> SyncOutcome {
        error!("Sync failed: {}", failure);
        self.progress.send_modify(|p| p.state = SyncState::Failed);
        self.set_idle();
        SyncOutcome::Failed(failure)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Rebuild child lists from the accepted blocks' parents, in walk order
///
/// Children of dropped blocks were re-parented during the walk, so this both
/// removes ids that are not sent and adds the promoted ones.
fn relink_children(blocks: &mut [BlockRecord]) {
    let mut children: HashMap<String, Vec<ChildRef>> = HashMap::new();
    for block in blocks.iter() {
        if let Some(parent) = &block.parent {
            children
                .entry(parent.clone())
                .or_default()
                .push(ChildRef::Id(block.id.clone()));
        }
    }
    for block in blocks.iter_mut() {
        block.children = children.remove(&block.id).unwrap_or_default();
    }
}

/// Stable ids of the root blocks of a tree, looking through blank blocks
fn root_refs(tree: &[RawBlock]) -> Vec<ChildRef> {
    let mut roots = Vec::new();
    for block in tree {
        collect_roots(block, &mut roots);
    }
    roots
}

fn collect_roots(block: &RawBlock, roots: &mut Vec<ChildRef>) {
    if !block.is_blank() {
        if let Some(id) = block.stable_id() {
            roots.push(ChildRef::id(id));
        }
        return;
    }
    for child in &block.children {
        if let RawChild::Block(child) = child {
            collect_roots(child, roots);
        }
    }
}

/// `/page/<url-encoded name>` → page name
pub fn page_name_from_route(path: &str) -> Option<String> {
    let path = path.trim_start_matches('#');
    let rest = path.strip_prefix("/page/")?;
    let encoded = rest.split(['/', '?']).next()?;
    let name = urlencoding::decode(encoded).ok()?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
