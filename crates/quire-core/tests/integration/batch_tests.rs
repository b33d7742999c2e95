//! Integration tests for BatchCoordinator and SyncService.
//!
//! These tests verify that every task of a batch is dispatched and awaited
//! regardless of sibling failures, and that deletions are best effort.

use std::time::Duration;

use crate::integration::common::{MockBackend, RecordingReporter};
use quire_core::{
    AppError, BatchCoordinator, ContentItem, MetaFormat, SyncConfig, SyncEvent, SyncOperation,
    SyncService,
};

fn service(backend: &MockBackend) -> SyncService<MockBackend> {
    SyncService::new(backend.clone(), SyncConfig::default(), MetaFormat::Yaml)
}

fn items(titles: &[&str]) -> Vec<ContentItem> {
    titles
        .iter()
        .map(|t| ContentItem::new(*t, format!("# {}", t)))
        .collect()
}

/// Item 3 of 5 fails: the other four are still applied and the batch
/// reports exactly one failure.
#[tokio::test(flavor = "multi_thread")]
async fn test_failed_item_does_not_stop_siblings() {
    let backend = MockBackend::new();
    backend.fail_title("item-3");

    let err = service(&backend)
        .handle(SyncEvent::ArticleAdded(items(&[
            "item-1", "item-2", "item-3", "item-4", "item-5",
        ])))
        .await
        .unwrap_err();

    match err {
        AppError::BatchFailed {
            operation,
            failed,
            total,
            source,
        } => {
            assert_eq!(operation, "create");
            assert_eq!(failed, 1);
            assert_eq!(total, 5);
            assert!(matches!(*source, AppError::RemoteRejected { status: 400, .. }));
        }
        other => panic!("Expected BatchFailed, got {:?}", other),
    }

    let mut titles = backend.post_titles();
    titles.sort();
    assert_eq!(titles, vec!["item-1", "item-2", "item-4", "item-5"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_batch_names_failed_item() {
    let backend = MockBackend::new();
    backend.fail_title("b");
    let coordinator = BatchCoordinator::new(backend.clone());

    let result = coordinator
        .run_batch(items(&["a", "b", "c"]), SyncOperation::Create)
        .await;

    assert_eq!(result.dispatched, 3);
    assert_eq!(result.succeeded, vec!["a", "c"]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].item, "b");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_replaces_existing_post() {
    let backend = MockBackend::new();
    let id = backend.seed_post("hello", "old body");

    let item = ContentItem::new("hello", "new body").with_tags(["rust"]);
    let result = service(&backend)
        .handle(SyncEvent::ArticleUpdated(vec![item]))
        .await
        .unwrap();

    assert_eq!(result.succeeded, vec!["hello"]);
    assert_eq!(backend.post_body(id).as_deref(), Some("new body"));
    assert_eq!(backend.tag_creates(), vec!["rust"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_without_remote_post_is_not_found() {
    let backend = MockBackend::new();

    let err = service(&backend)
        .handle(SyncEvent::ArticleUpdated(items(&["missing"])))
        .await
        .unwrap_err();

    match err {
        AppError::BatchFailed { source, .. } => {
            assert!(matches!(*source, AppError::NotFound(_)));
        }
        other => panic!("Expected BatchFailed, got {:?}", other),
    }
    assert!(backend.updated_posts().is_empty());
}

/// Keyword search also returns longer titles; only the exact title counts.
#[tokio::test(flavor = "multi_thread")]
async fn test_update_matches_exact_title_only() {
    let backend = MockBackend::new();
    let tips = backend.seed_post("Rust tips", "tips");
    let rust = backend.seed_post("Rust", "rust");

    service(&backend)
        .handle(SyncEvent::ArticleUpdated(vec![ContentItem::new("Rust", "updated")]))
        .await
        .unwrap();

    assert_eq!(backend.post_body(rust).as_deref(), Some("updated"));
    assert_eq!(backend.post_body(tips).as_deref(), Some("tips"));
}

/// Remote titles are not unique; the first match is the one updated.
#[tokio::test(flavor = "multi_thread")]
async fn test_update_with_duplicate_titles_uses_first_match() {
    let backend = MockBackend::new();
    let first = backend.seed_post("dup", "one");
    let second = backend.seed_post("dup", "two");

    service(&backend)
        .handle(SyncEvent::ArticleUpdated(vec![ContentItem::new("dup", "three")]))
        .await
        .unwrap();

    let updated: Vec<i64> = backend.updated_posts().into_iter().map(|(id, _)| id).collect();
    assert_eq!(updated, vec![first]);
    assert_eq!(backend.post_body(second).as_deref(), Some("two"));
}

/// Three titles, one without a remote post: a single delete call carries
/// exactly the two resolvable ids.
#[tokio::test(flavor = "multi_thread")]
async fn test_delete_is_best_effort() {
    let backend = MockBackend::new();
    let a = backend.seed_post("a", "");
    let c = backend.seed_post("c", "");

    let result = service(&backend)
        .handle(SyncEvent::ArticleDeleted(items(&["a", "b", "c"])))
        .await
        .unwrap();

    assert_eq!(backend.delete_calls(), vec![vec![a, c]]);
    assert_eq!(result.succeeded, vec!["a", "c"]);
    assert_eq!(result.skipped, vec!["b"]);
    assert!(backend.post_titles().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_without_matches_skips_call() {
    let backend = MockBackend::new();
    backend.seed_post("kept", "");

    let result = service(&backend)
        .handle(SyncEvent::ArticleDeleted(items(&["gone", "also gone"])))
        .await
        .unwrap();

    assert!(backend.delete_calls().is_empty());
    assert_eq!(result.skipped.len(), 2);
    assert_eq!(backend.post_titles(), vec!["kept"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_failure_fails_every_resolved_item() {
    let backend = MockBackend::new();
    backend.seed_post("a", "");
    backend.seed_post("b", "");
    backend.fail_deletes();
    let coordinator = BatchCoordinator::new(backend.clone());

    let result = coordinator
        .run_batch(items(&["a", "b", "missing"]), SyncOperation::Delete)
        .await;

    assert_eq!(backend.delete_calls().len(), 1);
    assert_eq!(result.failed_count(), 2);
    assert!(matches!(
        result.failures[0].error,
        AppError::RemoteUnavailable(_)
    ));
    assert_eq!(result.skipped, vec!["missing"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_event_is_noop() {
    let backend = MockBackend::new();

    let result = service(&backend)
        .handle(SyncEvent::ArticleDeleted(Vec::new()))
        .await
        .unwrap();

    assert_eq!(result.dispatched, 0);
    assert!(result.is_success());
    assert!(backend.delete_calls().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_max_in_flight_bounds_concurrency() {
    let backend = MockBackend::new().with_write_delay(Duration::from_millis(20));
    let config = SyncConfig::default().with_max_in_flight(2);
    let service = SyncService::new(backend.clone(), config, MetaFormat::Yaml);

    let titles: Vec<String> = (0..6).map(|i| format!("post-{}", i)).collect();
    let batch = titles
        .iter()
        .map(|t| ContentItem::new(t.as_str(), ""))
        .collect();

    let result = service
        .handle(SyncEvent::ArticleAdded(batch))
        .await
        .unwrap();

    assert_eq!(result.succeeded_count(), 6);
    assert!(backend.peak_in_flight() <= 2);
}

/// A zero limit set directly on the config still lets one task run.
#[tokio::test(flavor = "multi_thread")]
async fn test_zero_max_in_flight_still_progresses() {
    let backend = MockBackend::new();
    let config = SyncConfig {
        max_in_flight: Some(0),
    };
    let service = SyncService::new(backend.clone(), config, MetaFormat::Yaml);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        service.handle(SyncEvent::ArticleAdded(items(&["a", "b", "c"]))),
    )
    .await
    .expect("batch should not hang")
    .unwrap();

    assert_eq!(result.succeeded_count(), 3);
    assert!(backend.peak_in_flight() <= 1);
}

/// One item's tag cannot be created: only that item fails, and the
/// siblings sharing the other tag are still published.
#[tokio::test(flavor = "multi_thread")]
async fn test_tag_failure_fails_only_its_item() {
    let backend = MockBackend::new();
    backend.fail_tag("broken");
    let coordinator = BatchCoordinator::new(backend.clone());

    let batch = vec![
        ContentItem::new("a", "").with_tags(["ok"]),
        ContentItem::new("b", "").with_tags(["ok", "broken"]),
        ContentItem::new("c", "").with_tags(["ok"]),
    ];
    let result = coordinator.run_batch(batch, SyncOperation::Create).await;

    assert_eq!(result.dispatched, 3);
    assert_eq!(result.succeeded, vec!["a", "c"]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].item, "b");
    assert!(matches!(
        result.failures[0].error,
        AppError::RemoteUnavailable(_)
    ));
    assert_eq!(backend.tag_creates(), vec!["ok"]);

    let mut titles = backend.post_titles();
    titles.sort();
    assert_eq!(titles, vec!["a", "c"]);
}

/// While the taxonomy listing is down, tagged items fail with the listing
/// error and untagged items are unaffected.
#[tokio::test(flavor = "multi_thread")]
async fn test_taxonomy_listing_failure_spares_untagged_items() {
    let backend = MockBackend::new();
    backend.fail_taxonomy_listing();

    let batch = vec![
        ContentItem::new("tagged", "").with_tags(["rust"]),
        ContentItem::new("plain", ""),
    ];
    let err = service(&backend)
        .handle(SyncEvent::ArticleAdded(batch))
        .await
        .unwrap_err();

    match err {
        AppError::BatchFailed {
            failed,
            total,
            source,
            ..
        } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 2);
            assert!(matches!(*source, AppError::RemoteUnavailable(_)));
        }
        other => panic!("Expected BatchFailed, got {:?}", other),
    }
    assert_eq!(backend.post_titles(), vec!["plain"]);
    assert!(backend.tag_creates().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_progress_events() {
    let backend = MockBackend::new();
    backend.seed_post("a", "");
    let reporter = RecordingReporter::default();

    service(&backend)
        .handle_with_progress(SyncEvent::ArticleDeleted(items(&["a", "b"])), &reporter)
        .await
        .unwrap();

    assert_eq!(
        reporter.events(),
        vec![
            "started delete 2",
            "skipped b",
            "ok a",
            "finished delete ok=1 failed=0",
        ]
    );
}
