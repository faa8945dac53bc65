//! kgsync reference parser
//!
//! Scans block text for the typed pointers an outliner knowledge base embeds in
//! its content:
//! - Page references: `[[page]]`
//! - Block references: `((block-uuid))`
//! - Tags: `#tag`
//! - Property keys: `key:: value`
//!
//! Each syntax is handled by an independent [`ReferenceMatcher`]; the default
//! [`ReferenceExtractor`] runs all four over the same text.

pub mod references;
pub mod types;

pub use references::{
    extract_references, BlockRefMatcher, PageRefMatcher, PropertyMatcher, ReferenceExtractor,
    ReferenceMatcher, TagMatcher,
};
pub use types::{Reference, ReferenceKind};
