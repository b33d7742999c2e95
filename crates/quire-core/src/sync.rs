//! Batch outcome types.
//!
//! A batch always runs to completion: every task is dispatched and awaited
//! before a [`BatchResult`] exists. Whether the batch as a whole failed is
//! decided afterward, from the collected outcomes.

use crate::AppError;
use crate::models::SyncOperation;

/// Outcome of a single task within a batch.
#[derive(Debug)]
pub enum TaskOutcome {
    Succeeded,
    Failed(AppError),
}

/// A task that did not reach the applied state.
#[derive(Debug)]
pub struct TaskFailure {
    /// Name of the content item the task was working on.
    pub item: String,
    pub error: AppError,
}

/// Aggregate outcome of one batch.
#[derive(Debug)]
pub struct BatchResult {
    pub operation: SyncOperation,
    /// Number of tasks dispatched.
    pub dispatched: usize,
    /// Names of the items that were applied remotely.
    pub succeeded: Vec<String>,
    /// Names skipped without error (delete targets with no remote match).
    pub skipped: Vec<String>,
    pub failures: Vec<TaskFailure>,
}

impl BatchResult {
    /// Creates an empty result for a batch of `dispatched` tasks.
    pub fn new(operation: SyncOperation, dispatched: usize) -> Self {
        Self {
            operation,
            dispatched,
            succeeded: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Records the outcome of the task for `item`.
    pub fn record(&mut self, item: impl Into<String>, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Succeeded => self.succeeded.push(item.into()),
            TaskOutcome::Failed(error) => self.failures.push(TaskFailure {
                item: item.into(),
                error,
            }),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if no task failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts the result into an error if any task failed.
    ///
    /// The returned [`AppError::BatchFailed`] carries the first failure as
    /// its source. Already applied items are not rolled back.
    pub fn into_result(mut self) -> Result<Self, AppError> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        let failed = self.failures.len();
        let first = self.failures.swap_remove(0);
        Err(AppError::BatchFailed {
            operation: self.operation.as_str(),
            failed,
            total: self.dispatched,
            source: Box::new(first.error),
        })
    }
}
