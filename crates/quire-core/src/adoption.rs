//! Initial adoption: pulling the remote corpus back as local content.
//!
//! Only posts that carry the editor marker this system writes are adopted;
//! posts authored through other means stay under the backend's control.

use crate::AppError;
use crate::batch::{BatchCoordinator, flatten};
use crate::config::MetaFormat;
use crate::models::{ContentItem, DEFAULT_EDITOR_TYPE, PostQuery};
use crate::traits::RemoteApi;

/// Fetches every published post this system could have written.
pub struct AdoptionService<A: RemoteApi> {
    api: A,
    coordinator: BatchCoordinator<A>,
    meta_format: MetaFormat,
}

impl<A: RemoteApi> AdoptionService<A> {
    pub fn new(api: A, meta_format: MetaFormat) -> Self {
        let coordinator = BatchCoordinator::new(api.clone());
        Self {
            api,
            coordinator,
            meta_format,
        }
    }

    pub(crate) fn with_coordinator(
        api: A,
        coordinator: BatchCoordinator<A>,
        meta_format: MetaFormat,
    ) -> Self {
        Self {
            api,
            coordinator,
            meta_format,
        }
    }

    /// Returns every published Markdown post as a [`ContentItem`].
    ///
    /// Post details are fetched concurrently, one task per post. Every fetch
    /// is awaited before the result is decided; if any failed the whole call
    /// fails with [`AppError::BatchFailed`].
    pub async fn fetch_all_published_items(&self) -> Result<Vec<ContentItem>, AppError> {
        tracing::info!("Fetching published posts for adoption");
        let listed = self.api.list_posts(&PostQuery::published()).await?;
        let listed_count = listed.len();

        let ids: Vec<i64> = listed
            .into_iter()
            .filter(|post| post.has_editor(DEFAULT_EDITOR_TYPE))
            .map(|post| post.id)
            .collect();

        tracing::debug!(
            listed = listed_count,
            adoptable = ids.len(),
            "Filtered posts by editor marker"
        );

        let fetched = self
            .coordinator
            .fan_out(ids.clone(), |id| {
                let api = self.api.clone();
                async move { api.get_post(id).await }
            })
            .await;

        let total = ids.len();
        let mut items = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (id, joined) in ids.into_iter().zip(fetched) {
            match flatten(joined) {
                Ok(post) => items.push(post.into_content_item(self.meta_format)),
                Err(e) => {
                    tracing::warn!(id, error = %e, "Failed to fetch post detail");
                    failures.push(e);
                }
            }
        }

        if !failures.is_empty() {
            let failed = failures.len();
            return Err(AppError::BatchFailed {
                operation: "adopt",
                failed,
                total,
                source: Box::new(failures.swap_remove(0)),
            });
        }

        tracing::info!(count = items.len(), "Adoption fetch complete");
        Ok(items)
    }
}
