//! Content store seam
//!
//! The host application owns a live, mutable tree of pages and blocks. Core
//! only reads from it. Raw entities mirror the host's JSON shapes (camelCase,
//! optional everywhere) so that partially-malformed data deserializes and is
//! dealt with during normalization rather than at the boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Content store lookup failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Content store lookup failed: {0}")]
    Lookup(String),
}

/// Result type for content store operations
pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Raw entities
// ============================================================================

/// Pointer to another entity as the host embeds it (`{"id": 12}`,
/// `{"uuid": "..."}`, `{"name": "notes", "originalName": "Notes"}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    /// Transient database handle
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub uuid: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub original_name: Option<String>,
}

impl EntityRef {
    pub fn handle(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            ..Default::default()
        }
    }

    /// Stable uuid, if carried and non-empty
    pub fn stable_id(&self) -> Option<&str> {
        self.uuid.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Display name, preferring the original casing
    pub fn page_name(&self) -> Option<&str> {
        self.original_name
            .as_deref()
            .or(self.name.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Child entry of a raw block
///
/// Fully-loaded trees nest child blocks; shallow lookups return
/// `["uuid", "<id>"]` pairs instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawChild {
    Id(String),
    Pair(String, String),
    Block(Box<RawBlock>),
    Other(Value),
}

/// Block as delivered by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    /// Transient database handle
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub uuid: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub created_at: Option<Value>,

    #[serde(default)]
    pub updated_at: Option<Value>,

    #[serde(default)]
    pub parent: Option<EntityRef>,

    #[serde(default)]
    pub page: Option<EntityRef>,

    #[serde(default)]
    pub children: Vec<RawChild>,

    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl RawBlock {
    /// True when the block carries no graph-worthy text
    pub fn is_blank(&self) -> bool {
        self.content.as_deref().is_none_or(|c| c.trim().is_empty())
    }

    pub fn stable_id(&self) -> Option<&str> {
        self.uuid.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Page as delivered by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPage {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub uuid: Option<String>,

    /// Lower-cased page name
    #[serde(default)]
    pub name: Option<String>,

    /// Page name as typed by the user
    #[serde(default)]
    pub original_name: Option<String>,

    #[serde(default)]
    pub created_at: Option<Value>,

    #[serde(default)]
    pub updated_at: Option<Value>,

    #[serde(default)]
    pub properties: Map<String, Value>,

    #[serde(default, rename = "journal?")]
    pub journal: bool,

    /// Journal date as `yyyymmdd`
    #[serde(default)]
    pub journal_day: Option<i64>,
}

impl RawPage {
    /// Display name, preferring the original casing; `None` when blank
    pub fn display_name(&self) -> Option<&str> {
        self.original_name
            .as_deref()
            .or(self.name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Graph currently open in the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphInfo {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
}

// ============================================================================
// Lookup keys and notifications
// ============================================================================

/// How to address a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKey {
    Uuid(String),
    Handle(i64),
}

/// How to address a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKey {
    Name(String),
    Handle(i64),
}

/// Batch of entities the host reports as changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(default)]
    pub blocks: Vec<RawBlock>,
    #[serde(default)]
    pub pages: Vec<RawPage>,
}

impl ChangeEvent {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.pages.is_empty()
    }
}

/// The user navigated; `path` is the host route such as `/page/Notes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteChange {
    pub path: String,
}

// ============================================================================
// Trait
// ============================================================================

/// Read-only access to the host content store
///
/// Every call may suspend. Implementations report missing entities as
/// `BlockNotFound` / `PageNotFound`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch one block. Without `include_children`, children come back as
    /// `["uuid", id]` pairs.
    async fn get_block(&self, key: &BlockKey, include_children: bool) -> StoreResult<RawBlock>;

    async fn get_page(&self, key: &PageKey) -> StoreResult<RawPage>;

    async fn all_pages(&self) -> StoreResult<Vec<RawPage>>;

    /// Root blocks of a page with their full subtrees, in document order
    async fn page_blocks_tree(&self, page_name: &str) -> StoreResult<Vec<RawBlock>>;

    async fn current_page(&self) -> StoreResult<Option<RawPage>>;

    async fn current_graph(&self) -> StoreResult<GraphInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_block_accepts_host_shape() {
        let raw: RawBlock = serde_json::from_value(json!({
            "id": 12,
            "uuid": "64f1c2a0-0000-0000-0000-000000000001",
            "content": "Hello [[World]]",
            "parent": {"id": 3},
            "page": {"id": 3},
            "children": [["uuid", "child-1"], {"uuid": "child-2", "content": "x"}, 7],
            "properties": {"type": "note"}
        }))
        .unwrap();

        assert_eq!(raw.id, Some(12));
        assert_eq!(raw.parent, Some(EntityRef::handle(3)));
        assert_eq!(
            raw.children[0],
            RawChild::Pair("uuid".to_string(), "child-1".to_string())
        );
        assert!(matches!(raw.children[1], RawChild::Block(_)));
        assert_eq!(raw.children[2], RawChild::Other(json!(7)));
        assert!(!raw.is_blank());
    }

    #[test]
    fn test_raw_page_journal_flag() {
        let raw: RawPage = serde_json::from_value(json!({
            "name": "jan 5th, 2024",
            "originalName": "Jan 5th, 2024",
            "journal?": true,
            "journalDay": 20240105
        }))
        .unwrap();

        assert!(raw.journal);
        assert_eq!(raw.journal_day, Some(20240105));
        assert_eq!(raw.display_name(), Some("Jan 5th, 2024"));
    }

    #[test]
    fn test_blank_names_and_content() {
        let page = RawPage {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(page.display_name(), None);

        let block = RawBlock {
            content: Some(" \n\t".to_string()),
            ..Default::default()
        };
        assert!(block.is_blank());
        assert!(RawBlock::default().is_blank());
    }
}
