//! Batch coordination: fan-out of one task per item, fan-in of every outcome.
//!
//! # Execution model
//!
//! ```text
//! run_batch(items, op)
//!   ├─ spawn task(item 1) ─┐
//!   ├─ spawn task(item 2) ─┤   tasks run on the tokio worker pool,
//!   ├─ ...                 ─┤   independent except for the per-kind
//!   └─ spawn task(item N) ─┘   taxonomy locks
//!   join_all(handles)          waits for every task, whatever its outcome
//!   └─ BatchResult
//! ```
//!
//! A failing task never prevents its siblings from being dispatched or
//! awaited, and nothing is cancelled. Deletions first look up every title
//! concurrently, then remove all resolved posts with a single call.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinError;

use crate::AppError;
use crate::config::SyncConfig;
use crate::models::{ContentItem, RemotePost, SyncOperation};
use crate::progress::{BatchEvent, SilentReporter, SyncReporter};
use crate::publish::{ItemSynchronizer, find_post_by_title};
use crate::sync::{BatchResult, TaskOutcome};
use crate::traits::RemoteApi;

/// Dispatches batches of items onto the runtime and waits for all of them.
#[derive(Clone)]
pub struct BatchCoordinator<A: RemoteApi> {
    api: A,
    synchronizer: ItemSynchronizer<A>,
    config: SyncConfig,
}

impl<A: RemoteApi> BatchCoordinator<A> {
    /// Creates a coordinator with default configuration.
    pub fn new(api: A) -> Self {
        Self::with_config(api, SyncConfig::default())
    }

    pub fn with_config(api: A, config: SyncConfig) -> Self {
        let synchronizer = ItemSynchronizer::new(api.clone());
        Self {
            api,
            synchronizer,
            config,
        }
    }

    pub fn synchronizer(&self) -> &ItemSynchronizer<A> {
        &self.synchronizer
    }

    /// Applies `operation` to every item and returns once all tasks finished.
    pub async fn run_batch(
        &self,
        items: Vec<ContentItem>,
        operation: SyncOperation,
    ) -> BatchResult {
        self.run_batch_with_progress(items, operation, &SilentReporter)
            .await
    }

    /// Same as [`run_batch`](Self::run_batch), emitting progress events.
    pub async fn run_batch_with_progress<R: SyncReporter>(
        &self,
        items: Vec<ContentItem>,
        operation: SyncOperation,
        reporter: &R,
    ) -> BatchResult {
        reporter.report(BatchEvent::BatchStarted {
            operation,
            total: items.len(),
        });

        let result = match operation {
            SyncOperation::Create | SyncOperation::Update => {
                self.apply_batch(items, operation, reporter).await
            }
            SyncOperation::Delete => self.delete_batch(items, reporter).await,
        };

        reporter.report(BatchEvent::BatchFinished { result: &result });
        result
    }

    async fn apply_batch<R: SyncReporter>(
        &self,
        items: Vec<ContentItem>,
        operation: SyncOperation,
        reporter: &R,
    ) -> BatchResult {
        let mut result = BatchResult::new(operation, items.len());
        let names: Vec<String> = items.iter().map(|i| i.name.clone()).collect();

        let outcomes = self
            .fan_out(items, |item| {
                let synchronizer = self.synchronizer.clone();
                async move { synchronizer.apply(&item, operation).await }
            })
            .await;

        for (name, joined) in names.into_iter().zip(outcomes) {
            let outcome = match flatten(joined) {
                Ok(()) => TaskOutcome::Succeeded,
                Err(e) => TaskOutcome::Failed(e),
            };
            report_outcome(reporter, operation, &name, &outcome);
            result.record(name, outcome);
        }

        result
    }

    async fn delete_batch<R: SyncReporter>(
        &self,
        items: Vec<ContentItem>,
        reporter: &R,
    ) -> BatchResult {
        let operation = SyncOperation::Delete;
        let mut result = BatchResult::new(operation, items.len());
        let titles: Vec<String> = items.into_iter().map(|i| i.name).collect();

        let lookups = self
            .fan_out(titles.clone(), |title| {
                let api = self.api.clone();
                async move { find_post_by_title(&api, &title).await }
            })
            .await;

        let mut ids = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut resolved = Vec::new();
        for (title, joined) in titles.into_iter().zip(lookups) {
            match flatten(joined) {
                Ok(Some(RemotePost { id, .. })) => {
                    if seen_ids.insert(id) {
                        ids.push(id);
                    }
                    resolved.push(title);
                }
                Ok(None) => {
                    tracing::debug!(title = title.as_str(), "No remote post to delete");
                    result.skipped.push(title);
                }
                Err(e) => {
                    let outcome = TaskOutcome::Failed(e);
                    report_outcome(reporter, operation, &title, &outcome);
                    result.record(title, outcome);
                }
            }
        }

        if !result.skipped.is_empty() {
            reporter.report(BatchEvent::ItemsSkipped {
                operation,
                items: &result.skipped,
            });
        }

        if ids.is_empty() {
            tracing::debug!("Nothing resolved for deletion, skipping delete call");
            return result;
        }

        tracing::info!(count = ids.len(), "Deleting remote posts");
        match self.api.delete_posts(&ids).await {
            Ok(()) => {
                for title in resolved {
                    report_outcome(reporter, operation, &title, &TaskOutcome::Succeeded);
                    result.record(title, TaskOutcome::Succeeded);
                }
            }
            Err(e) => {
                let message = e.to_string();
                let mut first = Some(e);
                for title in resolved {
                    let error = first.take().unwrap_or_else(|| {
                        AppError::Generic(format!("batch delete failed: {}", message))
                    });
                    let outcome = TaskOutcome::Failed(error);
                    report_outcome(reporter, operation, &title, &outcome);
                    result.record(title, outcome);
                }
            }
        }

        result
    }

    /// Spawns one task per input and waits for all of them.
    ///
    /// Results come back in input order. A task that panics surfaces as a
    /// `JoinError` in its slot; it never aborts the others.
    pub(crate) async fn fan_out<I, T, F, Fut>(
        &self,
        inputs: Vec<I>,
        make_task: F,
    ) -> Vec<Result<Result<T, AppError>, JoinError>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let limiter = self
            .config
            .max_in_flight
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                let task = make_task(input);
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    let _permit = acquire(limiter).await?;
                    task.await
                })
            })
            .collect();

        join_all(handles).await
    }
}

async fn acquire(
    limiter: Option<Arc<Semaphore>>,
) -> Result<Option<OwnedSemaphorePermit>, AppError> {
    match limiter {
        Some(semaphore) => semaphore
            .acquire_owned()
            .await
            .map(Some)
            .map_err(|_| AppError::Generic("task limiter closed unexpectedly".to_string())),
        None => Ok(None),
    }
}

/// Collapses a join result into the task's own result.
pub(crate) fn flatten<T>(joined: Result<Result<T, AppError>, JoinError>) -> Result<T, AppError> {
    match joined {
        Ok(inner) => inner,
        Err(e) if e.is_panic() => Err(AppError::Generic(format!("task panicked: {}", e))),
        Err(e) => Err(AppError::Generic(format!("task did not complete: {}", e))),
    }
}

fn report_outcome<R: SyncReporter>(
    reporter: &R,
    operation: SyncOperation,
    item: &str,
    outcome: &TaskOutcome,
) {
    match outcome {
        TaskOutcome::Succeeded => reporter.report(BatchEvent::TaskSucceeded { operation, item }),
        TaskOutcome::Failed(error) => reporter.report(BatchEvent::TaskFailed {
            operation,
            item,
            error,
        }),
    }
}
