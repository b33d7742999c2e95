use thiserror::Error;

use crate::models::TaxonomyKind;

/// Application-wide error types.
///
/// This enum represents every failure the synchronization engine and its
/// collaborators can surface. It uses the `thiserror` crate so the remote
/// client and the core share a single error vocabulary.
///
/// # Scope
///
/// None of these errors end the process. Each one is scoped either to a single
/// task (one item of a batch) or to the batch as a whole, via
/// [`AppError::BatchFailed`].
///
/// # Examples
///
/// ```
/// use quire_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::NotFound("post titled 'Hello'".to_string()))
/// }
///
/// assert!(example().is_err());
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// The remote backend could not be reached or answered with a transient
    /// failure (connection refused, timeout, HTTP 5xx, rate limiting).
    #[error("Remote backend unavailable: {0}")]
    RemoteUnavailable(String),

    /// A taxonomy entry that was just created could not be found afterward.
    ///
    /// This is the visible symptom of the resolver's optimistic
    /// query-then-create pattern racing with an external writer.
    #[error("Inconsistent remote state: {kind} '{name}' was created but cannot be found")]
    InconsistentRemoteState { kind: TaxonomyKind, name: String },

    /// The target of an update or lookup does not exist remotely.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend understood the request but refused it (validation error,
    /// authentication failure, conflict).
    #[error("Remote rejected request (HTTP {status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// At least one task of a batch failed.
    ///
    /// Every task of the batch was still dispatched and awaited. `source`
    /// holds the first failure observed.
    #[error("{operation} batch failed: {failed} of {total} tasks failed")]
    BatchFailed {
        operation: &'static str,
        failed: usize,
        total: usize,
        #[source]
        source: Box<AppError>,
    },

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic application error for cases not covered by specific variants.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::RemoteUnavailable(msg) => {
                if msg.contains("timed out") {
                    "Request timed out. The blog may be slow or unreachable.\n   Try again later or check the site URL.".to_string()
                } else {
                    format!(
                        "Cannot reach the blog backend: {}\n   Check your internet connection and the site URL.",
                        msg
                    )
                }
            }
            AppError::InconsistentRemoteState { kind, name } => format!(
                "The blog reported creating {} '{}' but it does not show up.\n   Another client may be editing taxonomies; run the sync again.",
                kind, name
            ),
            AppError::NotFound(what) => format!("Nothing on the blog matches {}", what),
            AppError::RemoteRejected { status, message } => match status {
                401 | 403 => "The blog rejected the credentials.\n   Check QUIRE_USERNAME and QUIRE_PASSWORD.".to_string(),
                _ => format!("The blog refused the request: {}", message),
            },
            AppError::BatchFailed {
                operation,
                failed,
                total,
                source,
            } => format!(
                "{} of {} {} tasks failed. First error: {}",
                failed,
                total,
                operation,
                source.user_message()
            ),
            AppError::SerializationError(e) => format!("Unexpected data format: {}", e),
            AppError::InvalidUrl(url) => format!("Invalid site URL: {}", url),
            AppError::ConfigError(msg) => format!("Configuration problem: {}", msg),
            AppError::Generic(msg) => msg.clone(),
        }
    }

    /// Returns true if running the same operation again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::RemoteUnavailable(_) | AppError::InconsistentRemoteState { .. } => true,
            AppError::BatchFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
