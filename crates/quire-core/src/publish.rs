//! Item synchronization: applying one content item to the backend.

use crate::AppError;
use crate::models::{ContentItem, PostQuery, PostRequest, RemotePost, SyncOperation, TaxonomyKind};
use crate::taxonomy::TaxonomyResolver;
use crate::traits::RemoteApi;

/// Converts local content items into remote create and update calls.
///
/// Taxonomy ids are filled in through a shared [`TaxonomyResolver`]; clones
/// of a synchronizer share its locks.
#[derive(Clone)]
pub struct ItemSynchronizer<A: RemoteApi> {
    api: A,
    resolver: TaxonomyResolver<A>,
}

impl<A: RemoteApi> ItemSynchronizer<A> {
    pub fn new(api: A) -> Self {
        let resolver = TaxonomyResolver::new(api.clone());
        Self { api, resolver }
    }

    pub fn resolver(&self) -> &TaxonomyResolver<A> {
        &self.resolver
    }

    /// Creates or updates the remote post for `item`.
    ///
    /// Categories and tags are resolved first, in the item's order. For an
    /// update the existing post is then located by title. The write itself is
    /// a single remote call, so the post is either fully written or left as
    /// it was.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if an update finds no post with the item's title
    /// - [`AppError::RemoteRejected`] if the backend refuses the write
    /// - [`AppError::RemoteUnavailable`] and resolver errors, propagated as is
    pub async fn apply(
        &self,
        item: &ContentItem,
        operation: SyncOperation,
    ) -> Result<(), AppError> {
        let request = self.build_request(item).await?;

        match operation {
            SyncOperation::Create => {
                let id = self.api.create_post(&request).await?;
                tracing::debug!(title = item.name.as_str(), id, "Post created");
            }
            SyncOperation::Update => {
                let post = find_post_by_title(&self.api, &item.name)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("post titled '{}'", item.name)))?;
                self.api.update_post(post.id, &request).await?;
                tracing::debug!(title = item.name.as_str(), id = post.id, "Post updated");
            }
            SyncOperation::Delete => {
                return Err(AppError::Generic(
                    "deletions are applied per batch, not per item".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Resolves the item's taxonomy and builds the remote write payload.
    pub async fn build_request(&self, item: &ContentItem) -> Result<PostRequest, AppError> {
        let category_ids = self
            .resolver
            .resolve_ordered(&item.category_names(), TaxonomyKind::Category)
            .await?;
        let tag_ids = self
            .resolver
            .resolve_ordered(&item.tags, TaxonomyKind::Tag)
            .await?;

        Ok(PostRequest::for_item(item, category_ids, tag_ids))
    }
}

/// Finds the remote post whose title is exactly `title`.
///
/// The backend only offers keyword search, so results are filtered to exact
/// title matches. Titles are not unique remotely: when several posts share a
/// title the first one returned wins.
pub async fn find_post_by_title<A: RemoteApi>(
    api: &A,
    title: &str,
) -> Result<Option<RemotePost>, AppError> {
    let candidates = api.list_posts(&PostQuery::by_title(title)).await?;
    let mut matches = candidates.into_iter().filter(|p| p.title == title);
    let first = matches.next();
    if first.is_some() && matches.next().is_some() {
        tracing::warn!(title, "Several remote posts share this title, using the first");
    }
    Ok(first)
}
