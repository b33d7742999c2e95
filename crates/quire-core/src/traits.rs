//! Trait definitions for external dependencies.
//!
//! The synchronization engine never talks HTTP directly. It drives a
//! [`RemoteApi`] implementation, which keeps the core testable against an
//! in-memory fake and independent of any particular blog backend.
//!
//! # Example
//!
//! ```
//! use quire_core::traits::RemoteApi;
//! use quire_core::{AppError, PostQuery};
//!
//! // Business logic uses traits, not concrete types
//! async fn count_posts<A: RemoteApi>(api: &A) -> Result<usize, AppError> {
//!     Ok(api.list_posts(&PostQuery::published()).await?.len())
//! }
//! ```

use std::future::Future;

use crate::AppError;
use crate::models::{PostQuery, PostRequest, RemotePost, TaxonomyEntry};

/// Client for the remote blog backend.
///
/// Implementations must be cheap to clone: the batch coordinator hands one
/// clone to every spawned task. Errors should be mapped onto
/// [`AppError::RemoteUnavailable`], [`AppError::NotFound`] and
/// [`AppError::RemoteRejected`] so callers can tell transient failures from
/// refusals.
pub trait RemoteApi: Send + Sync + Clone + 'static {
    /// Lists every post matching `query`, across all pages.
    fn list_posts(
        &self,
        query: &PostQuery,
    ) -> impl Future<Output = Result<Vec<RemotePost>, AppError>> + Send;

    /// Fetches the full detail of one post, including its content.
    fn get_post(&self, id: i64) -> impl Future<Output = Result<RemotePost, AppError>> + Send;

    /// Creates a post and returns its remote id.
    fn create_post(
        &self,
        request: &PostRequest,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Replaces the post `id` with `request`.
    fn update_post(
        &self,
        id: i64,
        request: &PostRequest,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Deletes every post in `ids` with a single call.
    fn delete_posts(&self, ids: &[i64]) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Lists every category.
    fn list_categories(&self) -> impl Future<Output = Result<Vec<TaxonomyEntry>, AppError>> + Send;

    /// Creates a top-level category.
    fn create_category(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<TaxonomyEntry, AppError>> + Send;

    /// Lists every tag.
    fn list_tags(&self) -> impl Future<Output = Result<Vec<TaxonomyEntry>, AppError>> + Send;

    /// Creates a tag.
    fn create_tag(&self, name: &str)
    -> impl Future<Output = Result<TaxonomyEntry, AppError>> + Send;
}
