//! Blog type definitions
//!
//! Post records, the JSON views served by resources and tools, and the
//! argument types accepted by the blog tools.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Minimum trimmed content length for a new post
pub const MIN_CONTENT_CHARS: usize = 10;

/// Number of content characters kept in a generated summary
pub const SUMMARY_CHARS: usize = 50;

/// Subscriber count reported by the notification step
pub const SUBSCRIBER_COUNT: u32 = 150;

/// A blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Sequential identifier, assigned at creation
    pub id: String,

    pub title: String,

    pub content: String,

    /// Tags in insertion order, original casing preserved
    #[serde(default)]
    pub tags: Vec<String>,

    /// Generated by the publish workflow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Create a post with no summary or publication state
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            tags,
            summary: None,
            status: None,
            published_at: None,
        }
    }

    /// Whether any tag equals `category`, ignoring case
    pub fn has_tag(&self, category: &str) -> bool {
        let category = category.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == category)
    }

    /// Whether `needle` (already lowercased) occurs in the title, content or a tag
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }

    /// Replace the tags with `(tags ∪ add) \ remove`, keeping first-seen order.
    ///
    /// Duplicates already on the post collapse as well.
    pub fn update_tags(&mut self, add: &[String], remove: &[String]) {
        let mut seen = HashSet::new();
        let merged: Vec<String> = std::mem::take(&mut self.tags)
            .into_iter()
            .chain(add.iter().cloned())
            .filter(|t| !remove.contains(t) && seen.insert(t.clone()))
            .collect();
        self.tags = merged;
    }

    /// First `SUMMARY_CHARS` characters of the content followed by an ellipsis
    pub fn summarize(&self) -> String {
        let head: String = self.content.chars().take(SUMMARY_CHARS).collect();
        format!("{}...", head)
    }
}

/// Publication state of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

// ==================== Views ====================

/// `blog://posts`
#[derive(Debug, Serialize)]
pub struct PostListView<'a> {
    pub posts: &'a [Post],
    pub total: usize,
    pub template: &'static str,
}

/// `blog://post/{post_id}`
#[derive(Debug, Serialize)]
pub struct SinglePostView<'a> {
    #[serde(flatten)]
    pub post: &'a Post,
    pub template: &'static str,
}

/// `blog://category/{category}`
#[derive(Debug, Serialize)]
pub struct CategoryView<'a> {
    pub category: &'a str,
    pub posts: Vec<&'a Post>,
    pub count: usize,
    pub template: &'static str,
}

/// Result of `search_posts`
#[derive(Debug, Serialize)]
pub struct SearchView<'a> {
    pub query: &'a str,
    pub results: Vec<&'a Post>,
    pub count: usize,
    pub total_searched: usize,
}

pub mod templates {
    pub const LIST: &str = "list_view";
    pub const SINGLE: &str = "single_view";
    pub const CATEGORY: &str = "category_view";
}

// ==================== Tool arguments ====================

/// Arguments of `create_post`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct NewPost {
    /// Post title (must not be blank)
    #[validate(custom = "validate_title")]
    pub title: String,

    /// Post body (at least 10 characters after trimming)
    #[validate(custom = "validate_content")]
    pub content: String,

    /// Optional tags
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

fn validate_title(title: &str) -> Result<(), validator::ValidationError> {
    if title.trim().is_empty() {
        return Err(validator::ValidationError::new("empty_title"));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), validator::ValidationError> {
    if content.trim().chars().count() < MIN_CONTENT_CHARS {
        return Err(validator::ValidationError::new("content_too_short"));
    }
    Ok(())
}

/// Arguments of `publish_workflow`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PublishRequest {
    /// ID of the post to publish
    pub post_id: String,

    /// Notify subscribers once published
    #[serde(default = "default_true")]
    pub notify: bool,

    /// Generate a summary from the post content
    #[serde(default = "default_true")]
    pub generate_summary: bool,
}

impl PublishRequest {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            notify: true,
            generate_summary: true,
        }
    }
}

/// Arguments of `batch_update_tags`
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct TagUpdate {
    /// Posts to update; unknown IDs are skipped
    pub post_ids: Vec<String>,

    /// Tags to add to every post
    #[serde(default)]
    pub add_tags: Option<Vec<String>>,

    /// Tags to remove from every post (applied after additions)
    #[serde(default)]
    pub remove_tags: Option<Vec<String>>,
}

/// Arguments of `search_posts`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchQuery {
    /// Case-insensitive text to look for in titles, content and tags
    pub query: String,

    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, limit: usize) -> Self {
        Self {
            query: query.into(),
            limit,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_limit() -> usize {
    10
}
