//! Entry point for inbound article events.
//!
//! A [`SyncService`] owns one exclusion domain: every batch it runs, and
//! every clone of it, resolves taxonomy under the same two locks.

use crate::AppError;
use crate::adoption::AdoptionService;
use crate::batch::BatchCoordinator;
use crate::config::{MetaFormat, SyncConfig};
use crate::models::{ContentItem, SyncOperation};
use crate::progress::{SilentReporter, SyncReporter};
use crate::sync::BatchResult;
use crate::traits::RemoteApi;

/// A change to the local article corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    ArticleAdded(Vec<ContentItem>),
    ArticleUpdated(Vec<ContentItem>),
    ArticleDeleted(Vec<ContentItem>),
}

impl SyncEvent {
    pub fn operation(&self) -> SyncOperation {
        match self {
            SyncEvent::ArticleAdded(_) => SyncOperation::Create,
            SyncEvent::ArticleUpdated(_) => SyncOperation::Update,
            SyncEvent::ArticleDeleted(_) => SyncOperation::Delete,
        }
    }

    pub fn items(&self) -> &[ContentItem] {
        match self {
            SyncEvent::ArticleAdded(items)
            | SyncEvent::ArticleUpdated(items)
            | SyncEvent::ArticleDeleted(items) => items,
        }
    }

    fn into_parts(self) -> (SyncOperation, Vec<ContentItem>) {
        let operation = self.operation();
        match self {
            SyncEvent::ArticleAdded(items)
            | SyncEvent::ArticleUpdated(items)
            | SyncEvent::ArticleDeleted(items) => (operation, items),
        }
    }
}

/// Synchronization service, generic over the remote backend.
///
/// # Example
///
/// ```ignore
/// use quire_core::{MetaFormat, SyncConfig, SyncEvent, SyncService};
///
/// let service = SyncService::new(client, SyncConfig::default(), MetaFormat::Yaml);
/// let result = service
///     .handle(SyncEvent::ArticleAdded(vec![item]))
///     .await?;
/// println!("{} posts created", result.succeeded_count());
/// ```
#[derive(Clone)]
pub struct SyncService<A: RemoteApi> {
    coordinator: BatchCoordinator<A>,
    api: A,
    meta_format: MetaFormat,
}

impl<A: RemoteApi> SyncService<A> {
    pub fn new(api: A, config: SyncConfig, meta_format: MetaFormat) -> Self {
        let coordinator = BatchCoordinator::with_config(api.clone(), config);
        Self {
            coordinator,
            api,
            meta_format,
        }
    }

    pub fn coordinator(&self) -> &BatchCoordinator<A> {
        &self.coordinator
    }

    /// Applies the event's items and waits for every task.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BatchFailed`] if at least one item failed. Items
    /// that were applied before the failure stay applied.
    pub async fn handle(&self, event: SyncEvent) -> Result<BatchResult, AppError> {
        self.handle_with_progress(event, &SilentReporter).await
    }

    /// Same as [`handle`](Self::handle), emitting progress events.
    pub async fn handle_with_progress<R: SyncReporter>(
        &self,
        event: SyncEvent,
        reporter: &R,
    ) -> Result<BatchResult, AppError> {
        let (operation, items) = event.into_parts();
        if items.is_empty() {
            tracing::debug!(%operation, "Empty event, nothing to do");
            return Ok(BatchResult::new(operation, 0));
        }

        self.coordinator
            .run_batch_with_progress(items, operation, reporter)
            .await
            .into_result()
    }

    /// Pulls every published post written by this system back as local items.
    pub async fn fetch_all_published_items(&self) -> Result<Vec<ContentItem>, AppError> {
        let adoption = AdoptionService::with_coordinator(
            self.api.clone(),
            self.coordinator.clone(),
            self.meta_format,
        );
        adoption.fetch_all_published_items().await
    }
}
