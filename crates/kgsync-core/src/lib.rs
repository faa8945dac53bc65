//! # kgsync core
//!
//! Shared model and seams for the knowledge-graph sync pipeline:
//!
//! - [`records`]: canonical Block/Page records produced by normalization
//! - [`validation`]: structural checks over records
//! - [`issues`]: per-page aggregation of validation failures
//! - [`content_store`]: read interface into the host's live content store
//! - [`backend`]: the graph backend as seen by the sync engine
//! - [`envelope`]: `POST /data` wire envelope
//! - [`memory`]: snapshot-backed [`ContentStore`] implementation
//!
//! Core defines the traits; `kgsync-client` implements [`GraphBackend`] over
//! HTTP and `kgsync-pipeline` orchestrates everything.

pub mod backend;
pub mod content_store;
pub mod envelope;
pub mod issues;
pub mod memory;
pub mod records;
pub mod sync_status;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use backend::GraphBackend;
pub use content_store::{
    BlockKey, ChangeEvent, ContentStore, EntityRef, GraphInfo, PageKey, RawBlock, RawChild,
    RawPage, RouteChange, StoreError, StoreResult,
};
pub use envelope::{Envelope, PayloadType};
pub use issues::{IssueCategory, IssueSummary, IssueTracker, PageIssueSummary, ValidationIssue};
pub use memory::{GraphSnapshot, InMemoryContentStore, SnapshotError, SnapshotPage};
pub use records::{BlockRecord, ChildRef, EntityKind, PageRecord};
pub use sync_status::SyncStatus;
pub use validation::{validate_block, validate_page, Validate, ValidationReport};

pub use kgsync_parser::{extract_references, Reference, ReferenceKind};
