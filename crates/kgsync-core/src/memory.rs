//! Snapshot-backed content store
//!
//! [`InMemoryContentStore`] answers [`ContentStore`] queries from a JSON export
//! of a graph. On load, every page and block is hydrated the way the host
//! hands them out: transient handles are assigned where missing, and blocks
//! point at their page and parent by handle only.

use crate::content_store::{
    BlockKey, ContentStore, EntityRef, GraphInfo, PageKey, RawBlock, RawChild, RawPage,
    StoreError, StoreResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors from loading a snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error reading snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One page and its block tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotPage {
    #[serde(flatten)]
    pub page: RawPage,

    #[serde(default)]
    pub blocks: Vec<RawBlock>,
}

/// Exported graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub name: String,

    #[serde(default)]
    pub path: Option<String>,

    /// Page the user is looking at, by name
    #[serde(default)]
    pub current_page: Option<String>,

    #[serde(default)]
    pub pages: Vec<SnapshotPage>,
}

/// In-memory [`ContentStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    graph: GraphInfo,
    current_page: Option<String>,
    pages: Vec<SnapshotPage>,
    page_by_name: HashMap<String, usize>,
    page_by_handle: HashMap<i64, usize>,
    blocks: HashMap<String, RawBlock>,
    block_uuid_by_handle: HashMap<i64, String>,
}

impl InMemoryContentStore {
    pub fn new(snapshot: GraphSnapshot) -> Self {
        let mut next_handle = max_handle(&snapshot) + 1;
        let mut store = Self {
            graph: GraphInfo {
                name: snapshot.name,
                path: snapshot.path,
            },
            current_page: snapshot.current_page,
            ..Default::default()
        };

        for mut entry in snapshot.pages {
            let page_handle = *entry.page.id.get_or_insert_with(|| {
                next_handle += 1;
                next_handle
            });
            for block in &mut entry.blocks {
                hydrate(block, page_handle, page_handle, &mut next_handle);
            }
            for block in &entry.blocks {
                store.index_block(block);
            }

            let index = store.pages.len();
            if let Some(name) = entry.page.display_name() {
                store.page_by_name.insert(name.to_lowercase(), index);
            }
            store.page_by_handle.insert(page_handle, index);
            store.pages.push(entry);
        }

        debug!(
            graph = %store.graph.name,
            pages = store.pages.len(),
            blocks = store.blocks.len(),
            "Loaded graph snapshot"
        );
        store
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: GraphSnapshot = serde_json::from_str(json)?;
        Ok(Self::new(snapshot))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn index_block(&mut self, block: &RawBlock) {
        for child in &block.children {
            if let RawChild::Block(child) = child {
                self.index_block(child);
            }
        }
        if let Some(uuid) = block.stable_id() {
            if let Some(handle) = block.id {
                self.block_uuid_by_handle.insert(handle, uuid.to_string());
            }
            self.blocks.insert(uuid.to_string(), block.clone());
        }
    }

    fn page_index(&self, key: &PageKey) -> Option<usize> {
        match key {
            PageKey::Name(name) => self.page_by_name.get(&name.trim().to_lowercase()).copied(),
            PageKey::Handle(handle) => self.page_by_handle.get(handle).copied(),
        }
    }
}

fn max_handle(snapshot: &GraphSnapshot) -> i64 {
    fn walk(block: &RawBlock, max: &mut i64) {
        *max = (*max).max(block.id.unwrap_or(0));
        for child in &block.children {
            if let RawChild::Block(child) = child {
                walk(child, max);
            }
        }
    }

    let mut max = 0;
    for entry in &snapshot.pages {
        max = max.max(entry.page.id.unwrap_or(0));
        for block in &entry.blocks {
            walk(block, &mut max);
        }
    }
    max
}

/// Assign handles and point blocks at their page/parent by handle
fn hydrate(block: &mut RawBlock, page_handle: i64, parent_handle: i64, next_handle: &mut i64) {
    let handle = *block.id.get_or_insert_with(|| {
        *next_handle += 1;
        *next_handle
    });
    if block.page.is_none() {
        block.page = Some(EntityRef::handle(page_handle));
    }
    if block.parent.is_none() {
        block.parent = Some(EntityRef::handle(parent_handle));
    }
    for child in &mut block.children {
        if let RawChild::Block(child) = child {
            hydrate(child, page_handle, handle, next_handle);
        }
    }
}

/// Replace nested child blocks with `["uuid", id]` pairs
fn shallow(block: &RawBlock) -> RawBlock {
    let mut block = block.clone();
    block.children = block
        .children
        .into_iter()
        .map(|child| match child {
            RawChild::Block(inner) => match inner.stable_id() {
                Some(uuid) => RawChild::Pair("uuid".to_string(), uuid.to_string()),
                None => RawChild::Block(inner),
            },
            other => other,
        })
        .collect();
    block
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get_block(&self, key: &BlockKey, include_children: bool) -> StoreResult<RawBlock> {
        let uuid = match key {
            BlockKey::Uuid(uuid) => uuid.clone(),
            BlockKey::Handle(handle) => self
                .block_uuid_by_handle
                .get(handle)
                .cloned()
                .ok_or_else(|| StoreError::BlockNotFound(format!("handle {handle}")))?,
        };

        let block = self
            .blocks
            .get(&uuid)
            .ok_or_else(|| StoreError::BlockNotFound(uuid.clone()))?;

        Ok(if include_children {
            block.clone()
        } else {
            shallow(block)
        })
    }

    async fn get_page(&self, key: &PageKey) -> StoreResult<RawPage> {
        self.page_index(key)
            .map(|i| self.pages[i].page.clone())
            .ok_or_else(|| StoreError::PageNotFound(format!("{key:?}")))
    }

    async fn all_pages(&self) -> StoreResult<Vec<RawPage>> {
        Ok(self.pages.iter().map(|entry| entry.page.clone()).collect())
    }

    async fn page_blocks_tree(&self, page_name: &str) -> StoreResult<Vec<RawBlock>> {
        self.page_index(&PageKey::Name(page_name.to_string()))
            .map(|i| self.pages[i].blocks.clone())
            .ok_or_else(|| StoreError::PageNotFound(page_name.to_string()))
    }

    async fn current_page(&self) -> StoreResult<Option<RawPage>> {
        match &self.current_page {
            Some(name) => self.get_page(&PageKey::Name(name.clone())).await.map(Some),
            None => Ok(None),
        }
    }

    async fn current_graph(&self) -> StoreResult<GraphInfo> {
        Ok(self.graph.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "name": "test-graph",
        "currentPage": "Notes",
        "pages": [
            {
                "name": "notes",
                "originalName": "Notes",
                "blocks": [
                    {
                        "uuid": "b1",
                        "content": "Hello [[World]]",
                        "children": [
                            {"uuid": "b2", "content": "nested"}
                        ]
                    },
                    {"uuid": "b3", "content": ""}
                ]
            },
            {"id": 50, "name": "world"}
        ]
    }"#;

    #[tokio::test]
    async fn test_hydration_assigns_handles_and_refs() {
        let store = InMemoryContentStore::from_json(SNAPSHOT).unwrap();
        assert_eq!(store.page_count(), 2);
        assert_eq!(store.block_count(), 3);

        let notes = store.get_page(&PageKey::Name("NOTES".to_string())).await.unwrap();
        let notes_handle = notes.id.unwrap();
        assert!(notes_handle > 50);

        let b1 = store.get_block(&BlockKey::Uuid("b1".to_string()), true).await.unwrap();
        assert_eq!(b1.parent, Some(EntityRef::handle(notes_handle)));
        assert_eq!(b1.page, Some(EntityRef::handle(notes_handle)));

        let b2 = store.get_block(&BlockKey::Uuid("b2".to_string()), false).await.unwrap();
        assert_eq!(b2.parent, Some(EntityRef::handle(b1.id.unwrap())));

        let by_handle = store
            .get_block(&BlockKey::Handle(b1.id.unwrap()), false)
            .await
            .unwrap();
        assert_eq!(by_handle.uuid.as_deref(), Some("b1"));
    }

    #[tokio::test]
    async fn test_shallow_lookup_returns_uuid_pairs() {
        let store = InMemoryContentStore::from_json(SNAPSHOT).unwrap();

        let shallow = store.get_block(&BlockKey::Uuid("b1".to_string()), false).await.unwrap();
        assert_eq!(
            shallow.children,
            vec![RawChild::Pair("uuid".to_string(), "b2".to_string())]
        );

        let deep = store.get_block(&BlockKey::Uuid("b1".to_string()), true).await.unwrap();
        assert!(matches!(deep.children[0], RawChild::Block(_)));
    }

    #[tokio::test]
    async fn test_missing_entities_are_not_found() {
        let store = InMemoryContentStore::from_json(SNAPSHOT).unwrap();

        let err = store.get_block(&BlockKey::Handle(9999), false).await.unwrap_err();
        assert!(matches!(err, StoreError::BlockNotFound(_)));

        let err = store.page_blocks_tree("missing").await.unwrap_err();
        assert_eq!(err, StoreError::PageNotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_current_page_and_graph() {
        let store = InMemoryContentStore::from_json(SNAPSHOT).unwrap();
        let page = store.current_page().await.unwrap().unwrap();
        assert_eq!(page.display_name(), Some("Notes"));
        assert_eq!(store.current_graph().await.unwrap().name, "test-graph");
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let store = InMemoryContentStore::load(&path).await.unwrap();
        assert_eq!(store.page_count(), 2);

        let err = InMemoryContentStore::from_json("{not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }
}
