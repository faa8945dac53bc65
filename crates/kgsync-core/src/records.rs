//! Canonical records
//!
//! Records are rebuilt from the live content store on every pass; nothing here
//! is cached or mutated in place between sync cycles.

use kgsync_parser::Reference;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Which kind of record an issue or lookup refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Block,
    Page,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => f.write_str("block"),
            Self::Page => f.write_str("page"),
        }
    }
}

/// Entry of a `children` / `blocks` list
///
/// The host occasionally hands back child entries that are not identifiers.
/// They are carried through normalization as `Malformed` so validation can
/// report them by index instead of silently dropping them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildRef {
    Id(String),
    Malformed(Value),
}

impl ChildRef {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn as_id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Malformed(_) => None,
        }
    }
}

impl From<&str> for ChildRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

/// Canonical block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Stable host identifier (uuid)
    pub id: String,

    pub content: String,

    /// ISO-8601 creation time
    pub created: Option<String>,

    /// ISO-8601 last update time
    pub updated: Option<String>,

    /// Stable id of the containing block; `None` for page-root blocks
    pub parent: Option<String>,

    /// Child ids in document order
    #[serde(default)]
    pub children: Vec<ChildRef>,

    /// Owning page name
    pub page: Option<String>,

    #[serde(default)]
    pub properties: BTreeMap<String, Value>,

    /// References found in `content`, grouped by reference kind
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl BlockRecord {
    /// Ids of well-formed children
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(ChildRef::as_id)
    }
}

/// Canonical page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub name: String,

    pub created: Option<String>,

    pub updated: Option<String>,

    #[serde(default)]
    pub properties: BTreeMap<String, Value>,

    /// Root block ids in document order
    #[serde(default)]
    pub blocks: Vec<ChildRef>,
}

impl PageRecord {
    pub fn block_ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(ChildRef::as_id)
    }
}
