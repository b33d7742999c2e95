//! Quire Core - Domain types and the synchronization engine.
//!
//! This crate keeps a remote blog's posts in line with a local article
//! corpus. It provides:
//!
//! - **Domain models**: [`ContentItem`], [`RemotePost`], [`TaxonomyEntry`], etc.
//! - **Taxonomy resolution**: [`TaxonomyResolver`] creates each missing
//!   category or tag exactly once, under a per-kind lock
//! - **Batch synchronization**: [`BatchCoordinator`] fans one task per item
//!   out onto the runtime and waits for all of them
//! - **Services**: [`SyncService`] for inbound article events,
//!   [`AdoptionService`] for pulling published posts back
//! - **Traits**: [`RemoteApi`] abstracts the blog backend
//! - **Progress reporting**: [`SyncReporter`] trait for decoupled logging/UI
//!
//! # Architecture
//!
//! The core never performs HTTP itself. Frontends construct a concrete
//! [`RemoteApi`] (see `quire-client`) and hand it to the services, which
//! clone it into every spawned task.
//!
//! # Example
//!
//! ```ignore
//! use quire_core::{ContentItem, MetaFormat, SyncConfig, SyncEvent, SyncService};
//!
//! let service = SyncService::new(client, SyncConfig::default(), MetaFormat::Yaml);
//! let item = ContentItem::new("Hello", "# Hello").with_tags(["rust"]);
//! service.handle(SyncEvent::ArticleAdded(vec![item])).await?;
//!
//! let adopted = service.fetch_all_published_items().await?;
//! ```

pub mod adoption;
pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod publish;
pub mod service;
pub mod sync;
pub mod taxonomy;
pub mod traits;

// Configuration
pub use config::{
    HttpConfig, MetaFormat, SiteConfig, SyncConfig, default_config_path, load_site_config,
};

// Error handling
pub use error::AppError;

// Domain models
pub use models::{
    CategoryRef, ContentItem, DEFAULT_EDITOR_TYPE, EditorType, PostQuery, PostRequest, PostStatus,
    RemotePost, SyncOperation, TaxonomyEntry, TaxonomyKind,
};

// Batch outcomes
pub use sync::{BatchResult, TaskFailure, TaskOutcome};

// Progress reporting
pub use progress::{BatchEvent, SilentReporter, SyncReporter, TracingReporter};

// Traits for dependency injection
pub use traits::RemoteApi;

// Services (generic over trait implementations)
pub use adoption::AdoptionService;
pub use batch::BatchCoordinator;
pub use publish::{ItemSynchronizer, find_post_by_title};
pub use service::{SyncEvent, SyncService};
pub use taxonomy::TaxonomyResolver;
