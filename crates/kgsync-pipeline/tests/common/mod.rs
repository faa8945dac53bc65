//! Shared fixtures for pipeline integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use kgsync_core::test_support::RecordingBackend;
use kgsync_core::{
    BlockKey, ContentStore, GraphInfo, GraphSnapshot, InMemoryContentStore, PageKey, RawBlock,
    RawPage, StoreError, StoreResult,
};
use kgsync_pipeline::{SyncEngine, SyncSettings};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const CREATED: &str = "2024-03-01T09:00:00Z";
pub const UPDATED: &str = "2024-03-02T09:00:00Z";

/// Block JSON with stable timestamps
pub fn block(uuid: &str, content: &str) -> Value {
    json!({
        "uuid": uuid,
        "content": content,
        "createdAt": CREATED,
        "updatedAt": UPDATED,
    })
}

pub fn block_with_children(uuid: &str, content: &str, children: Vec<Value>) -> Value {
    let mut value = block(uuid, content);
    value["children"] = Value::Array(children);
    value
}

/// Page JSON with stable timestamps
pub fn page(name: &str, blocks: Vec<Value>) -> Value {
    json!({
        "name": name.to_lowercase(),
        "originalName": name,
        "createdAt": CREATED,
        "updatedAt": UPDATED,
        "blocks": blocks,
    })
}

pub fn journal(day: i64, blocks: Vec<Value>) -> Value {
    let mut value = page(&day.to_string(), blocks);
    value["journal?"] = json!(true);
    value["journalDay"] = json!(day);
    value
}

pub fn store(pages: Vec<Value>) -> Arc<InMemoryContentStore> {
    let snapshot: GraphSnapshot =
        serde_json::from_value(json!({"name": "test-graph", "pages": pages})).unwrap();
    Arc::new(InMemoryContentStore::new(snapshot))
}

pub fn engine(store: Arc<dyn ContentStore>, backend: &RecordingBackend) -> SyncEngine {
    SyncEngine::new(store, Arc::new(backend.clone()), SyncSettings::default())
}

/// Content store wrapper that counts traversals and can fail selected pages
pub struct InstrumentedStore {
    inner: Arc<InMemoryContentStore>,
    failing_pages: HashSet<String>,
    all_pages_calls: AtomicUsize,
    tree_calls: AtomicUsize,
}

impl InstrumentedStore {
    pub fn new(inner: Arc<InMemoryContentStore>) -> Self {
        Self {
            inner,
            failing_pages: HashSet::new(),
            all_pages_calls: AtomicUsize::new(0),
            tree_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_tree_for(mut self, page: &str) -> Self {
        self.failing_pages.insert(page.to_lowercase());
        self
    }

    pub fn all_pages_calls(&self) -> usize {
        self.all_pages_calls.load(Ordering::SeqCst)
    }

    pub fn tree_calls(&self) -> usize {
        self.tree_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for InstrumentedStore {
    async fn get_block(&self, key: &BlockKey, include_children: bool) -> StoreResult<RawBlock> {
        self.inner.get_block(key, include_children).await
    }

    async fn get_page(&self, key: &PageKey) -> StoreResult<RawPage> {
        self.inner.get_page(key).await
    }

    async fn all_pages(&self) -> StoreResult<Vec<RawPage>> {
        self.all_pages_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.all_pages().await
    }

    async fn page_blocks_tree(&self, page_name: &str) -> StoreResult<Vec<RawBlock>> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_pages.contains(&page_name.to_lowercase()) {
            return Err(StoreError::Lookup(format!("tree unavailable for {page_name}")));
        }
        self.inner.page_blocks_tree(page_name).await
    }

    async fn current_page(&self) -> StoreResult<Option<RawPage>> {
        self.inner.current_page().await
    }

    async fn current_graph(&self) -> StoreResult<GraphInfo> {
        self.inner.current_graph().await
    }
}
