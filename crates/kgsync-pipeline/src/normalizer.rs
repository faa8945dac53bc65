//! Raw entity → canonical record conversion
//!
//! The normalizer resolves every identifier to its stable UUID, converts host
//! timestamps to RFC 3339 and extracts references from block content. It
//! never fails: lookup errors are logged and turn into `None` (skip the
//! record) or an absent optional field.

use chrono::{DateTime, SecondsFormat, Utc};
use kgsync_core::issues::UNNAMED_PAGE;
use kgsync_core::{
    extract_references, BlockKey, BlockRecord, ChildRef, ContentStore, EntityRef, IssueTracker,
    PageKey, PageRecord, RawBlock, RawChild, RawPage,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Issue recorded for pages without a usable name
pub const NAMELESS_PAGE_ISSUE: &str = "Nameless page skipped";

/// Converts raw content-store entities into [`BlockRecord`] / [`PageRecord`]
#[derive(Clone)]
pub struct RecordNormalizer {
    store: Arc<dyn ContentStore>,
}

impl RecordNormalizer {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Normalize a block whose page is not known from context
    pub async fn normalize_block(&self, raw: &RawBlock) -> Option<BlockRecord> {
        self.normalize_block_in_page(raw, None).await
    }

    /// Normalize a block; `page_hint` names the page being traversed
    ///
    /// Returns `None` for blank blocks and for blocks whose identifier lookup
    /// fails. Neither case is a validation issue.
    pub async fn normalize_block_in_page(
        &self,
        raw: &RawBlock,
        page_hint: Option<&str>,
    ) -> Option<BlockRecord> {
        if raw.is_blank() {
            debug!(handle = ?raw.id, uuid = ?raw.uuid, "Skipping block with empty content");
            return None;
        }
        let content = raw.content.clone().unwrap_or_default();

        let id = match raw.stable_id() {
            Some(uuid) => uuid.to_string(),
            None => match raw.id {
                Some(handle) => self.block_uuid(handle).await?,
                None => String::new(),
            },
        };

        let page_handle = raw.page.as_ref().and_then(|page| page.id);
        let parent = match &raw.parent {
            Some(parent) => self.resolve_parent(parent, page_handle).await,
            None => None,
        };

        let mut children = Vec::with_capacity(raw.children.len());
        for child in &raw.children {
            if let Some(child) = self.child_ref(child).await {
                children.push(child);
            }
        }

        let page = match page_hint.map(str::trim).filter(|p| !p.is_empty()) {
            Some(hint) => Some(hint.to_string()),
            None => self.page_name(raw.page.as_ref()).await,
        };

        let now = Utc::now();
        let references = extract_references(&content);

        Some(BlockRecord {
            id,
            created: Some(timestamp(raw.created_at.as_ref(), now)),
            updated: Some(timestamp(raw.updated_at.as_ref(), now)),
            parent,
            children,
            page,
            properties: properties(&raw.properties),
            references,
            content,
        })
    }

    /// Normalize a page; `root_blocks` are the ids of its accepted root blocks
    ///
    /// A page without a name is dropped and one issue is recorded for it.
    pub fn normalize_page(
        &self,
        raw: &RawPage,
        root_blocks: Vec<ChildRef>,
        tracker: &mut IssueTracker,
    ) -> Option<PageRecord> {
        let Some(name) = raw.display_name() else {
            warn!(handle = ?raw.id, "Skipping page without a name");
            tracker.record_page_issue(UNNAMED_PAGE, &[NAMELESS_PAGE_ISSUE.to_string()]);
            return None;
        };

        let now = Utc::now();
        Some(PageRecord {
            name: name.to_string(),
            created: Some(timestamp(raw.created_at.as_ref(), now)),
            updated: Some(timestamp(raw.updated_at.as_ref(), now)),
            properties: properties(&raw.properties),
            blocks: root_blocks,
        })
    }

    async fn block_uuid(&self, handle: i64) -> Option<String> {
        match self.store.get_block(&BlockKey::Handle(handle), false).await {
            Ok(block) => match block.stable_id() {
                Some(uuid) => Some(uuid.to_string()),
                None => {
                    warn!(handle, "Block lookup returned no uuid; skipping");
                    None
                }
            },
            Err(e) => {
                warn!(handle, "Block lookup failed; skipping: {}", e);
                None
            }
        }
    }

    async fn resolve_parent(&self, parent: &EntityRef, page_handle: Option<i64>) -> Option<String> {
        if let Some(uuid) = parent.stable_id() {
            return Some(uuid.to_string());
        }
        let handle = parent.id?;
        if page_handle == Some(handle) {
            return None;
        }
        match self.store.get_block(&BlockKey::Handle(handle), false).await {
            Ok(block) => block.stable_id().map(str::to_string),
            Err(e) => {
                debug!(handle, "Parent lookup failed, treating as page root: {}", e);
                None
            }
        }
    }

    async fn child_ref(&self, child: &RawChild) -> Option<ChildRef> {
        match child {
            RawChild::Id(id) => Some(ChildRef::Id(id.clone())),
            RawChild::Pair(_, uuid) => Some(ChildRef::Id(uuid.clone())),
            RawChild::Block(block) => match (block.stable_id(), block.id) {
                (Some(uuid), _) => Some(ChildRef::id(uuid)),
                (None, Some(handle)) => self.block_uuid(handle).await.map(ChildRef::Id),
                (None, None) => {
                    debug!("Dropping child block without uuid or handle");
                    None
                }
            },
            RawChild::Other(value) => Some(ChildRef::Malformed(value.clone())),
        }
    }

    async fn page_name(&self, page: Option<&EntityRef>) -> Option<String> {
        let page = page?;
        if let Some(name) = page.page_name() {
            return Some(name.to_string());
        }
        let handle = page.id?;
        match self.store.get_page(&PageKey::Handle(handle)).await {
            Ok(page) => page.display_name().map(str::to_string),
            Err(e) => {
                debug!(handle, "Page lookup failed: {}", e);
                None
            }
        }
    }
}

/// Host timestamp as RFC 3339
///
/// Epoch milliseconds are converted, strings pass through for validation to
/// judge, anything else becomes `fallback`.
fn timestamp(value: Option<&Value>, fallback: DateTime<Utc>) -> String {
    let millis = match value {
        Some(Value::String(s)) if !s.trim().is_empty() => return s.clone(),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    };
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or(fallback)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn properties(raw: &serde_json::Map<String, Value>) -> BTreeMap<String, Value> {
    raw.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}
