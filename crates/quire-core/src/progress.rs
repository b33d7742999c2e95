//! Progress reporting for batch synchronization.
//!
//! The coordinator reports from the fan-in side only, after a task's result
//! has been collected, so reporters never cross task boundaries.

use crate::AppError;
use crate::models::SyncOperation;
use crate::sync::BatchResult;

/// Events emitted while a batch runs.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// Tasks were dispatched for every item of the batch.
    BatchStarted {
        operation: SyncOperation,
        total: usize,
    },
    /// One item was applied remotely.
    TaskSucceeded {
        operation: SyncOperation,
        item: &'a str,
    },
    /// One item failed; its siblings keep running.
    TaskFailed {
        operation: SyncOperation,
        item: &'a str,
        error: &'a AppError,
    },
    /// Delete targets that have no remote counterpart.
    ItemsSkipped {
        operation: SyncOperation,
        items: &'a [String],
    },
    /// Every task reached a terminal state.
    BatchFinished { result: &'a BatchResult },
}

/// Trait for reporting synchronization progress.
pub trait SyncReporter: Send + Sync {
    /// Called when a sync event occurs.
    ///
    /// The default implementation does nothing (silent mode).
    fn report(&self, event: BatchEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl SyncReporter for SilentReporter {}

/// Tracing-based reporter for CLI logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl SyncReporter for TracingReporter {
    fn report(&self, event: BatchEvent<'_>) {
        match event {
            BatchEvent::BatchStarted { operation, total } => {
                tracing::info!(%operation, total, "Batch dispatched");
            }
            BatchEvent::TaskSucceeded { operation, item } => {
                tracing::debug!(%operation, item, "Item applied");
            }
            BatchEvent::TaskFailed {
                operation,
                item,
                error,
            } => {
                tracing::warn!(%operation, item, %error, "Item failed");
            }
            BatchEvent::ItemsSkipped { operation, items } => {
                tracing::info!(%operation, skipped = items.len(), "No remote match, skipping");
            }
            BatchEvent::BatchFinished { result } => {
                if result.is_success() {
                    tracing::info!(
                        operation = %result.operation,
                        succeeded = result.succeeded_count(),
                        skipped = result.skipped.len(),
                        "Batch complete"
                    );
                } else {
                    tracing::error!(
                        operation = %result.operation,
                        succeeded = result.succeeded_count(),
                        failed = result.failed_count(),
                        "Batch complete with failures"
                    );
                }
            }
        }
    }
}
