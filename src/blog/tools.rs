//! Mutating and procedural blog operations
//!
//! Every operation that writes to the content store clears the whole query
//! cache once it is done.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use validator::{Validate, ValidationErrors};

use crate::blog::cache::{CacheKey, QueryCache};
use crate::blog::store::ContentStore;
use crate::blog::types::{
    NewPost, PostStatus, PublishRequest, SearchQuery, SearchView, TagUpdate, MIN_CONTENT_CHARS,
    SUBSCRIBER_COUNT,
};
use crate::config::Latency;
use crate::error::{NotFoundError, Result, ValidationError};

/// 2024-01-01T12:00:00Z, stamped on every published post
const PUBLISHED_AT_SECS: i64 = 1_704_110_400;

/// Executes the blog tools against the content store
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    store: Arc<ContentStore>,
    cache: QueryCache,
    latency: Latency,
}

impl ToolExecutor {
    pub fn new(store: Arc<ContentStore>, cache: QueryCache, latency: Latency) -> Self {
        Self {
            store,
            cache,
            latency,
        }
    }

    /// Validate and store a new post, returning a confirmation line
    pub async fn create_post(&self, new_post: NewPost) -> Result<String> {
        new_post.validate().map_err(into_validation_error)?;

        let title = new_post.title.trim().to_string();
        let content = new_post.content.trim().to_string();
        let tags = new_post.tags.unwrap_or_default();

        let post_id = self.store.write().await.insert(title.clone(), content, tags);
        self.cache.clear();

        tracing::info!(post_id = %post_id, "post created");
        Ok(format!("Post '{}' created with ID: {}", title, post_id))
    }

    /// Validate, summarize, publish and notify, returning a step log.
    ///
    /// The store stays write-locked for the whole workflow. There is no
    /// rollback: a step that ran stays applied.
    pub async fn publish_workflow(&self, request: PublishRequest) -> Result<String> {
        let mut table = self.store.write().await;
        let post = table
            .get_mut(&request.post_id)
            .ok_or_else(|| NotFoundError::Post {
                post_id: request.post_id.clone(),
            })?;

        let mut steps = Vec::with_capacity(4);

        pause(self.latency.validate).await;
        steps.push("Post validated".to_string());

        if request.generate_summary {
            pause(self.latency.summarize).await;
            let summary = post.summarize();
            steps.push(format!("Summary generated: {}", summary));
            post.summary = Some(summary);
        }

        post.status = Some(PostStatus::Published);
        post.published_at = DateTime::from_timestamp(PUBLISHED_AT_SECS, 0);
        steps.push("Post marked as published".to_string());

        if request.notify {
            pause(self.latency.notify).await;
            steps.push(format!("{} subscribers notified", SUBSCRIBER_COUNT));
        }

        let title = post.title.clone();
        drop(table);
        self.cache.clear();

        tracing::info!(post_id = %request.post_id, steps = steps.len(), "post published");

        let mut log = format!("Publishing workflow completed for '{}':", title);
        for step in steps {
            log.push_str("\n- ");
            log.push_str(&step);
        }
        Ok(log)
    }

    /// Add then remove tags on each known post; returns the IDs that were updated
    pub async fn batch_update_tags(&self, update: TagUpdate) -> Result<Vec<String>> {
        let add = update.add_tags.unwrap_or_default();
        let remove = update.remove_tags.unwrap_or_default();
        let mut updated = Vec::new();

        let mut table = self.store.write().await;
        for post_id in update.post_ids {
            let Some(post) = table.get_mut(&post_id) else {
                tracing::debug!(post_id = %post_id, "skipping unknown post");
                continue;
            };

            pause(self.latency.tag_update).await;
            post.update_tags(&add, &remove);
            updated.push(post_id);
        }
        drop(table);

        self.cache.clear();
        Ok(updated)
    }

    /// Case-insensitive substring search in store order, capped at `limit`
    pub async fn search_posts(&self, search: SearchQuery) -> Result<String> {
        let key = CacheKey::search(&search.query, search.limit);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let needle = search.query.to_lowercase();
        let table = self.store.read().await;
        let results: Vec<_> = table
            .iter()
            .filter(|p| p.matches(&needle))
            .take(search.limit)
            .collect();

        let view = SearchView {
            query: &search.query,
            count: results.len(),
            results,
            total_searched: table.len(),
        };
        let result = serde_json::to_string_pretty(&view)?;

        self.cache.insert(&key, result.clone());
        Ok(result)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn into_validation_error(errors: ValidationErrors) -> ValidationError {
    let fields = errors.field_errors();
    if fields.contains_key("title") {
        ValidationError::EmptyTitle
    } else if fields.contains_key("content") {
        ValidationError::ContentTooShort {
            min: MIN_CONTENT_CHARS,
        }
    } else {
        ValidationError::InvalidParameter {
            name: "post".to_string(),
            message: errors.to_string(),
        }
    }
}
