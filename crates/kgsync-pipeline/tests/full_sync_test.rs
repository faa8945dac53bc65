//! Full sync and startup gating

mod common;

use chrono::NaiveDate;
use common::*;
use kgsync_core::test_support::RecordingBackend;
use kgsync_core::{IssueCategory, PayloadType, ReferenceKind, SyncStatus};
use kgsync_pipeline::{SyncEngine, SyncFailure, SyncOutcome, SyncSettings, SyncState};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn notes_scenario() {
    let store = store(vec![page(
        "Notes",
        vec![block("b1", "Hello [[World]]"), block("b2", "")],
    )]);
    let backend = RecordingBackend::new();
    let mut engine = engine(store, &backend);

    let outcome = engine.full_sync().await;
    let report = outcome.report().expect("completed");

    let pages = backend.page_batches();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].len(), 1);
    assert_eq!(pages[0][0].name, "Notes");
    assert_eq!(pages[0][0].block_ids().collect::<Vec<_>>(), vec!["b1"]);

    let blocks = backend.block_batches();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].len(), 1);
    let hello = &blocks[0][0];
    assert_eq!(hello.id, "b1");
    assert_eq!(hello.page.as_deref(), Some("Notes"));
    assert_eq!(hello.parent, None);
    assert_eq!(hello.references.len(), 1);
    assert_eq!(hello.references[0].kind, ReferenceKind::Page);
    assert_eq!(hello.references[0].name, "World");

    assert!(report.issues.is_empty());
    assert_eq!(report.blocks_skipped, 1);
    assert!(report.timestamp_updated);
    assert!(backend.diagnostics().is_empty());
    assert_eq!(engine.state(), SyncState::Idle);
}

#[tokio::test]
async fn page_batch_is_sent_before_block_batch() {
    let store = store(vec![page("Notes", vec![block("b1", "one")])]);
    let backend = RecordingBackend::new();
    engine(store, &backend).full_sync().await;

    let types: Vec<_> = backend.sent().iter().map(|e| e.payload_type).collect();
    assert_eq!(types, vec![PayloadType::PageBatch, PayloadType::BlockBatch]);
    assert!(backend
        .sent()
        .iter()
        .all(|e| e.graph_name == "test-graph" && e.source == "PKM Knowledge Graph Plugin"));
}

#[tokio::test]
async fn nested_blocks_resolve_parents_in_document_order() {
    let store = store(vec![page(
        "Project",
        vec![
            block_with_children(
                "a",
                "first",
                vec![block_with_children("a1", "nested", vec![block("a1x", "deep")])],
            ),
            block("b", "second"),
        ],
    )]);
    let backend = RecordingBackend::new();
    engine(store, &backend).full_sync().await;

    let blocks = backend.block_batches().concat();
    let ids: Vec<_> = blocks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "a1", "a1x", "b"]);

    assert_eq!(blocks[0].parent, None);
    assert_eq!(blocks[1].parent.as_deref(), Some("a"));
    assert_eq!(blocks[2].parent.as_deref(), Some("a1"));
    assert_eq!(blocks[0].child_ids().collect::<Vec<_>>(), vec!["a1"]);

    let pages = backend.page_batches().concat();
    assert_eq!(pages[0].block_ids().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[tokio::test]
async fn children_of_blank_block_are_promoted_to_roots() {
    let store = store(vec![page(
        "Notes",
        vec![block_with_children("blank", "", vec![block("child", "kept")])],
    )]);
    let backend = RecordingBackend::new();
    engine(store, &backend).full_sync().await;

    let blocks = backend.block_batches().concat();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].id, "child");
    assert_eq!(blocks[0].parent, None);

    let pages = backend.page_batches().concat();
    assert_eq!(pages[0].block_ids().collect::<Vec<_>>(), vec!["child"]);
}

#[tokio::test]
async fn children_of_rejected_block_attach_to_nearest_sent_ancestor() {
    let mut broken = block_with_children("broken", "bad timestamps", vec![block("leaf", "ok")]);
    broken["createdAt"] = json!("not a date");
    let store = store(vec![page(
        "Notes",
        vec![block_with_children("top", "top", vec![broken, block("sibling", "ok")])],
    )]);
    let backend = RecordingBackend::new();
    engine(store, &backend).full_sync().await;

    let blocks = backend.block_batches().concat();
    let ids: Vec<_> = blocks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["top", "leaf", "sibling"]);
    assert_eq!(blocks[0].child_ids().collect::<Vec<_>>(), vec!["leaf", "sibling"]);
    assert_eq!(blocks[1].parent.as_deref(), Some("top"));
    assert_eq!(blocks[2].parent.as_deref(), Some("top"));

    // Every parent and child id names a block sent in this session
    let sent: std::collections::HashSet<_> = ids.iter().copied().collect();
    for block in &blocks {
        assert!(block.parent.as_deref().is_none_or(|p| sent.contains(p)));
        assert!(block.child_ids().all(|c| sent.contains(c)));
    }
}

#[tokio::test]
async fn local_and_date_only_timestamps_are_sent() {
    let mut local = block("b1", "no offset");
    local["createdAt"] = json!("2024-03-01T09:00:00");
    local["updatedAt"] = json!("2024-03-01");
    let store = store(vec![page("Notes", vec![local])]);
    let backend = RecordingBackend::new();

    let outcome = engine(store, &backend).full_sync().await;
    let report = outcome.report().unwrap();

    assert_eq!(report.blocks_sent, 1);
    assert_eq!(report.records_rejected, 0);
    let blocks = backend.block_batches().concat();
    assert_eq!(blocks[0].created.as_deref(), Some("2024-03-01T09:00:00"));
}

#[tokio::test]
async fn host_values_in_errors_do_not_change_categories() {
    let mut odd = block("b1", "text");
    odd["updatedAt"] = json!("no content date");
    odd["children"] = json!([{"content": 5}]);
    let store = store(vec![page("Notes", vec![odd])]);
    let backend = RecordingBackend::new();

    let outcome = engine(store, &backend).full_sync().await;
    let issues = &outcome.report().unwrap().issues;

    assert_eq!(issues.count(IssueCategory::EmptyContent), 0);
    assert_eq!(issues.count(IssueCategory::InvalidTimestamp), 1);
    assert_eq!(issues.count(IssueCategory::InvalidChildren), 1);
}

#[tokio::test]
async fn non_string_children_are_reported_per_index() {
    let mut bad = block("bad", "has odd children");
    bad["children"] = json!([42, true]);
    let store = store(vec![page("Notes", vec![bad, block("good", "fine")])]);
    let backend = RecordingBackend::new();
    let mut engine = engine(store, &backend);

    let outcome = engine.full_sync().await;
    let report = outcome.report().unwrap();

    assert_eq!(report.records_rejected, 1);
    assert_eq!(report.issues.count(IssueCategory::InvalidChildren), 2);

    let ids: Vec<_> = backend
        .block_batches()
        .concat()
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(ids, vec!["good"]);
    let pages = backend.page_batches().concat();
    assert_eq!(pages[0].block_ids().collect::<Vec<_>>(), vec!["good"]);
}

#[tokio::test]
async fn issues_produce_a_diagnostic() {
    let mut stale = block("b1", "text");
    stale["updatedAt"] = json!("yesterday");
    let store = store(vec![page("Notes", vec![stale])]);
    let backend = RecordingBackend::new();
    let mut engine = engine(store, &backend);

    engine.full_sync().await;

    let diagnostics = backend.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].0.contains("Validation issues: 1"));
    assert_eq!(diagnostics[0].1["total_issues"], 1);
    assert_eq!(
        engine.issues().summary().count(IssueCategory::InvalidTimestamp),
        1
    );
}

#[tokio::test]
async fn nameless_page_is_skipped_with_one_issue() {
    let store = store(vec![
        json!({"name": "", "blocks": [block("x", "orphan")]}),
        page("Notes", vec![block("b1", "kept")]),
    ]);
    let backend = RecordingBackend::new();
    let mut engine = engine(store, &backend);

    let outcome = engine.full_sync().await;
    let summary = &outcome.report().unwrap().issues;

    assert_eq!(summary.total_issues, 1);
    assert_eq!(summary.count(IssueCategory::Other), 1);
    assert_eq!(backend.page_batches().concat().len(), 1);
    assert_eq!(backend.block_batches().concat().len(), 1);
}

#[tokio::test]
async fn full_batches_hold_at_most_one_hundred_records() {
    let blocks = (0..250)
        .map(|i| block(&format!("b{i}"), &format!("block {i}")))
        .collect();
    let store = store(vec![page("Big", blocks)]);
    let backend = RecordingBackend::new();

    let outcome = engine(store, &backend).full_sync().await;

    let sizes: Vec<_> = backend.block_batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    assert_eq!(outcome.report().unwrap().blocks_sent, 250);
}

#[tokio::test]
async fn full_sync_is_idempotent() {
    let store = store(vec![
        page("Notes", vec![block("b1", "Hello [[World]] #tag")]),
        page("World", vec![block_with_children("w1", "root", vec![block("w2", "leaf")])]),
    ]);
    let backend = RecordingBackend::new();
    let mut engine = engine(store, &backend);

    engine.full_sync().await;
    let first = (backend.page_batches(), backend.block_batches());
    backend.clear();

    engine.full_sync().await;
    let second = (backend.page_batches(), backend.block_batches());

    assert_eq!(first, second);
}

#[tokio::test]
async fn failed_batch_is_counted_and_session_continues() {
    let store = store(vec![page("Notes", vec![block("b1", "one")])]);
    let backend = RecordingBackend::new();
    backend.fail_send(0);

    let outcome = engine(store, &backend).full_sync().await;
    let report = outcome.report().unwrap();

    assert_eq!(report.failed_batches, 1);
    assert_eq!(report.batches_sent, 1);
    assert_eq!(report.blocks_sent, 1);
    assert_eq!(report.pages_sent, 0);
    assert!(report.timestamp_updated);
}

#[tokio::test]
async fn unreachable_backend_fails_without_side_effects() {
    let mut stale = block("b1", "text");
    stale["createdAt"] = json!("not a date");
    let store = store(vec![page("Notes", vec![stale])]);
    let backend = RecordingBackend::new();
    let mut engine = engine(store, &backend);

    engine.full_sync().await;
    let issues_before = engine.issues().summary();
    assert_eq!(issues_before.total_issues, 1);
    backend.clear();

    backend.set_available(false);
    let outcome = engine.full_sync().await;

    assert_eq!(outcome, SyncOutcome::Failed(SyncFailure::BackendUnavailable));
    assert_eq!(engine.issues().summary(), issues_before);
    assert_eq!(backend.send_calls(), 0);
    assert_eq!(backend.timestamp_updates(), 0);
    assert_eq!(engine.state(), SyncState::Idle);
}

#[tokio::test]
async fn tree_failure_skips_only_that_page() {
    let inner = store(vec![
        page("Broken", vec![block("x", "lost")]),
        page("Notes", vec![block("b1", "kept")]),
    ]);
    let store = Arc::new(InstrumentedStore::new(inner).failing_tree_for("Broken"));
    let backend = RecordingBackend::new();

    let outcome = engine(store.clone(), &backend).full_sync().await;

    assert!(outcome.is_completed());
    assert_eq!(store.tree_calls(), 2);
    let names: Vec<_> = backend
        .page_batches()
        .concat()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Notes"]);
}

#[tokio::test]
async fn large_graph_skips_old_journals() {
    let mut pages: Vec<_> = (0..100)
        .map(|i| page(&format!("Topic {i}"), vec![]))
        .collect();
    pages.push(journal(20240110, vec![block("old", "old entry")]));
    pages.push(journal(20240325, vec![block("new", "recent entry")]));
    let store = store(pages);
    let backend = RecordingBackend::new();

    let mut engine = SyncEngine::new(
        store,
        Arc::new(backend.clone()),
        SyncSettings::default(),
    )
    .with_today(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());

    let outcome = engine.full_sync().await;
    let report = outcome.report().unwrap();

    assert_eq!(report.pages_seen, 102);
    assert_eq!(report.pages_filtered, 1);
    let ids: Vec<_> = backend
        .block_batches()
        .concat()
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(ids, vec!["new"]);
}

#[tokio::test]
async fn small_graph_keeps_old_journals() {
    let store = store(vec![journal(20200101, vec![block("old", "old entry")])]);
    let backend = RecordingBackend::new();

    engine(store, &backend).full_sync().await;

    assert_eq!(backend.block_batches().concat().len(), 1);
}

#[tokio::test]
async fn start_skips_when_backend_is_current() {
    let inner = store(vec![page("Notes", vec![block("b1", "one")])]);
    let store = Arc::new(InstrumentedStore::new(inner));
    let backend = RecordingBackend::new();
    backend.set_status(Some(SyncStatus {
        full_sync_needed: false,
        ..Default::default()
    }));
    let mut engine = engine(store.clone(), &backend);

    let outcome = engine.start().await;

    assert_eq!(outcome, SyncOutcome::Skipped);
    assert_eq!(store.all_pages_calls(), 0);
    assert_eq!(backend.send_calls(), 0);
    assert_eq!(engine.state(), SyncState::Idle);
}

#[tokio::test]
async fn start_runs_full_sync_when_requested() {
    let store = store(vec![page("Notes", vec![block("b1", "one")])]);
    let backend = RecordingBackend::new();
    let mut engine = engine(store, &backend);

    assert!(engine.start().await.is_completed());
    assert_eq!(backend.timestamp_updates(), 1);

    // The timestamp update cleared the flag
    assert_eq!(engine.start().await, SyncOutcome::Skipped);
}

#[tokio::test]
async fn start_runs_full_sync_without_status() {
    let store = store(vec![page("Notes", vec![block("b1", "one")])]);
    let backend = RecordingBackend::new();
    backend.set_status(None);

    assert!(engine(store, &backend).start().await.is_completed());
    assert_eq!(backend.block_batches().concat().len(), 1);
}

#[tokio::test]
async fn start_fails_when_backend_is_down() {
    let store = store(vec![page("Notes", vec![block("b1", "one")])]);
    let backend = RecordingBackend::unavailable();

    let outcome = engine(store, &backend).start().await;

    assert_eq!(outcome, SyncOutcome::Failed(SyncFailure::BackendUnavailable));
    assert_eq!(backend.status_queries(), 0);
}

#[tokio::test]
async fn progress_is_published() {
    let store = store(vec![
        page("One", vec![block("a", "x")]),
        page("Two", vec![block("b", "y")]),
    ]);
    let backend = RecordingBackend::new();
    let mut engine = engine(store, &backend);
    let progress = engine.subscribe();

    engine.full_sync().await;

    let last = progress.borrow().clone();
    assert_eq!(last.state, SyncState::Idle);
    assert_eq!(last.pages_total, 2);
    assert_eq!(last.pages_done, 2);
    assert_eq!(last.blocks_sent, 2);
    assert_eq!(last.fraction(), 1.0);
}
