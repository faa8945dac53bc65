//! Sync orchestration layer
//!
//! Turns raw content-store entities into validated canonical records and
//! ships them to the graph backend in batches.
//!
//! ## Architecture
//!
//! A sync session runs these phases:
//! 1. **Gate**: probe the backend and decide whether a full sync is needed
//! 2. **Traverse**: list pages (journal-filtered on large graphs) and walk
//!    each page's block tree depth-first
//! 3. **Normalize**: convert raw entities with [`RecordNormalizer`]
//! 4. **Validate**: reject malformed records into the issue tracker
//! 5. **Batch**: buffer pages and blocks, flushing at the configured size
//! 6. **Finish**: send the diagnostic summary and mark the sync timestamp
//!
//! Infrastructure lives elsewhere: `kgsync-core` owns the record types and
//! traits, `kgsync-client` talks HTTP. This crate only coordinates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kgsync_pipeline::{SyncEngine, SyncSettings};
//!
//! let mut engine = SyncEngine::new(store, backend, SyncSettings::default());
//! let outcome = engine.start().await;
//! ```

pub mod batch;
pub mod engine;
pub mod journal;
pub mod normalizer;
pub mod progress;

pub use batch::BatchBuffer;
pub use engine::{
    page_name_from_route, SyncEngine, SyncFailure, SyncOutcome, SyncReport, SyncSettings,
    SyncState,
};
pub use journal::JournalWindow;
pub use normalizer::{RecordNormalizer, NAMELESS_PAGE_ISSUE};
pub use progress::{SyncPhase, SyncProgress};
