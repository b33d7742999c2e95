//! Integration tests for pulling published posts back as local items.

use crate::integration::common::MockBackend;
use quire_core::{
    AdoptionService, AppError, CategoryRef, ContentItem, MetaFormat, SyncConfig, SyncEvent,
    SyncService, TaxonomyEntry,
};

fn category(id: i64, name: &str, parent_id: Option<i64>) -> TaxonomyEntry {
    TaxonomyEntry {
        id,
        name: name.to_string(),
        parent_id,
    }
}

/// Only published posts written with the Markdown editor are adopted.
#[tokio::test(flavor = "multi_thread")]
async fn test_adoption_filters_by_editor_marker() {
    let backend = MockBackend::new();
    backend.seed_post("md-1", "one");
    backend.seed_post_with("rich", "<p>x</p>", Some("RICH_TEXT"), "PUBLISHED", Vec::new());
    backend.seed_post("md-2", "two");
    backend.seed_post_with("unknown", "?", None, "PUBLISHED", Vec::new());
    backend.seed_post_with("draft", "d", Some("MARKDOWN"), "DRAFT", Vec::new());

    let adoption = AdoptionService::new(backend.clone(), MetaFormat::Yaml);
    let mut items = adoption.fetch_all_published_items().await.unwrap();
    items.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["md-1", "md-2"]);
    assert_eq!(items[0].body, "one");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_adoption_links_category_parents() {
    let backend = MockBackend::new();
    backend.seed_post_with(
        "nested",
        "body",
        Some("MARKDOWN"),
        "PUBLISHED",
        vec![
            category(100, "tech", None),
            category(101, "rust", Some(100)),
            category(102, "orphan", Some(999)),
        ],
    );

    let adoption = AdoptionService::new(backend.clone(), MetaFormat::Json);
    let items = adoption.fetch_all_published_items().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].categories,
        vec![
            CategoryRef::new("tech"),
            CategoryRef::new("rust").with_parent("tech"),
            CategoryRef::new("orphan"),
        ]
    );
    assert_eq!(items[0].meta_format, MetaFormat::Json);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_adoption_fails_after_all_fetches() {
    let backend = MockBackend::new();
    backend.seed_post("a", "");
    let broken = backend.seed_post("b", "");
    backend.seed_post("c", "");
    backend.fail_post(broken);

    let adoption = AdoptionService::new(backend.clone(), MetaFormat::Yaml);
    let err = adoption.fetch_all_published_items().await.unwrap_err();

    match err {
        AppError::BatchFailed {
            operation,
            failed,
            total,
            source,
        } => {
            assert_eq!(operation, "adopt");
            assert_eq!(failed, 1);
            assert_eq!(total, 3);
            assert!(source.is_retryable());
        }
        other => panic!("Expected BatchFailed, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_adoption_of_empty_blog() {
    let backend = MockBackend::new();
    let adoption = AdoptionService::new(backend, MetaFormat::Yaml);

    let items = adoption.fetch_all_published_items().await.unwrap();
    assert!(items.is_empty());
}

/// Posts written by the service come back with their taxonomy.
#[tokio::test(flavor = "multi_thread")]
async fn test_published_items_come_back() {
    let backend = MockBackend::new();
    let service = SyncService::new(backend.clone(), SyncConfig::default(), MetaFormat::Toml);

    let item = ContentItem::new("hello", "# Hello")
        .with_summary("greeting")
        .with_categories(["notes"])
        .with_tags(["rust", "async"]);
    service
        .handle(SyncEvent::ArticleAdded(vec![item]))
        .await
        .unwrap();

    let items = service.fetch_all_published_items().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "hello");
    assert_eq!(items[0].body, "# Hello");
    assert_eq!(items[0].summary.as_deref(), Some("greeting"));
    assert_eq!(items[0].category_names(), vec!["notes"]);
    assert_eq!(items[0].tags, vec!["rust", "async"]);
    assert_eq!(items[0].meta_format, MetaFormat::Toml);
}
