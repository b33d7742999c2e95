//! Domain models shared by the synchronization engine and the remote client.
//!
//! Local content is described by [`ContentItem`]. Everything the Halo backend
//! sends or receives is modeled with camelCase serde types that ignore unknown
//! fields, so additions to the remote API never break deserialization.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MetaFormat;

/// Editor marker stored on every post this system writes.
pub const DEFAULT_EDITOR_TYPE: EditorType = EditorType::Markdown;

/// Default page size used when listing posts.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// =============================================================================
// Local content
// =============================================================================

/// A category reference carried by a local article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
    /// Name of the parent category, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl CategoryRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// A local unit of publishable content.
///
/// `name` is the business key: it becomes the remote post title and is the
/// keyword used to find the post again on update and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub meta_format: MetaFormat,
}

impl ContentItem {
    /// Creates an item with a title and body and no taxonomy.
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            summary: None,
            categories: Vec::new(),
            tags: Vec::new(),
            meta_format: MetaFormat::default(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = names.into_iter().map(CategoryRef::new).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = names.into_iter().map(Into::into).collect();
        self
    }

    /// Category names in the item's order.
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }
}

// =============================================================================
// Operations and taxonomy kinds
// =============================================================================

/// The remote operation a batch applies to its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    /// Returns the string representation used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A taxonomy namespace. Names are unique within a kind, not across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    Category,
    Tag,
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyKind::Category => write!(f, "category"),
            TaxonomyKind::Tag => write!(f, "tag"),
        }
    }
}

// =============================================================================
// Remote models
// =============================================================================

/// A category or tag as stored by the backend.
///
/// `parent_id` is only ever set for categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyEntry {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// Editor format of a remote post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditorType {
    Markdown,
    RichText,
}

/// Publication status of a remote post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Published,
    Draft,
    Recycle,
    Intimate,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Published => "PUBLISHED",
            PostStatus::Draft => "DRAFT",
            PostStatus::Recycle => "RECYCLE",
            PostStatus::Intimate => "INTIMATE",
        }
    }
}

/// A post as returned by the backend.
///
/// Listing endpoints omit `original_content`; detail endpoints fill it in.
/// `editor_type` is kept as a raw string so that markers unknown to this
/// system still deserialize and can be filtered out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub editor_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub original_content: Option<String>,
    #[serde(default)]
    pub categories: Vec<TaxonomyEntry>,
    #[serde(default)]
    pub tags: Vec<TaxonomyEntry>,
    /// Last update time in epoch milliseconds.
    #[serde(default)]
    pub update_time: Option<i64>,
}

impl RemotePost {
    /// Returns true if the stored editor marker matches `editor`.
    pub fn has_editor(&self, editor: EditorType) -> bool {
        let expected = match editor {
            EditorType::Markdown => "MARKDOWN",
            EditorType::RichText => "RICH_TEXT",
        };
        self.editor_type.as_deref() == Some(expected)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.update_time.and_then(DateTime::from_timestamp_millis)
    }

    /// Converts this post into a local content item.
    ///
    /// A category whose `parent_id` points at another category attached to
    /// the same post gets that category's name as its parent reference. A
    /// missing or unknown parent id leaves the reference empty.
    pub fn into_content_item(self, meta_format: MetaFormat) -> ContentItem {
        let names_by_id: HashMap<i64, &str> = self
            .categories
            .iter()
            .map(|c| (c.id, c.name.as_str()))
            .collect();

        let categories = self
            .categories
            .iter()
            .map(|c| CategoryRef {
                name: c.name.clone(),
                parent: c
                    .parent_id
                    .and_then(|pid| names_by_id.get(&pid))
                    .map(|name| name.to_string()),
            })
            .collect();

        ContentItem {
            name: self.title,
            body: self.original_content.unwrap_or_default(),
            summary: self.summary.filter(|s| !s.is_empty()),
            categories,
            tags: self.tags.into_iter().map(|t| t.name).collect(),
            meta_format,
        }
    }
}

/// Write payload for creating or updating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub title: String,
    pub original_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub category_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
    pub editor_type: EditorType,
    pub status: PostStatus,
    pub keep_raw: bool,
}

impl PostRequest {
    /// Builds the request for `item` with already resolved taxonomy ids.
    ///
    /// Every synced post is published with the Markdown editor marker.
    pub fn for_item(item: &ContentItem, category_ids: Vec<i64>, tag_ids: Vec<i64>) -> Self {
        Self {
            title: item.name.clone(),
            original_content: item.body.clone(),
            summary: item.summary.clone(),
            category_ids,
            tag_ids,
            editor_type: DEFAULT_EDITOR_TYPE,
            status: PostStatus::Published,
            keep_raw: false,
        }
    }
}

/// Filter for listing posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub keyword: Option<String>,
    pub status: Option<PostStatus>,
    pub page_size: u32,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            status: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PostQuery {
    /// Query matching posts whose title contains `title`.
    pub fn by_title(title: &str) -> Self {
        Self {
            keyword: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// Query matching every published post.
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Published),
            ..Default::default()
        }
    }
}
