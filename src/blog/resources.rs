//! Read-only blog queries
//!
//! Listing and single-post lookups go through the query cache; category
//! filtering is always recomputed.

use std::sync::Arc;

use crate::blog::cache::{CacheKey, QueryCache};
use crate::blog::store::ContentStore;
use crate::blog::types::{templates, CategoryView, PostListView, SinglePostView};
use crate::error::{NotFoundError, Result};

/// Resource provider over the content store
#[derive(Debug, Clone)]
pub struct ResourceProvider {
    store: Arc<ContentStore>,
    cache: QueryCache,
}

impl ResourceProvider {
    pub fn new(store: Arc<ContentStore>, cache: QueryCache) -> Self {
        Self { store, cache }
    }

    /// Every post plus the total count
    pub async fn list_all(&self) -> Result<String> {
        let key = CacheKey::AllPosts;
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let table = self.store.read().await;
        let view = PostListView {
            posts: table.as_slice(),
            total: table.len(),
            template: templates::LIST,
        };
        let result = serde_json::to_string_pretty(&view)?;

        self.cache.insert(&key, result.clone());
        Ok(result)
    }

    /// A single post by ID
    pub async fn get_one(&self, post_id: &str) -> Result<String> {
        let key = CacheKey::post(post_id);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let table = self.store.read().await;
        let post = table.get(post_id).ok_or_else(|| NotFoundError::Post {
            post_id: post_id.to_string(),
        })?;

        let result = serde_json::to_string_pretty(&SinglePostView {
            post,
            template: templates::SINGLE,
        })?;

        self.cache.insert(&key, result.clone());
        Ok(result)
    }

    /// Posts carrying `category` as a tag, compared case-insensitively
    pub async fn list_by_category(&self, category: &str) -> Result<String> {
        let table = self.store.read().await;
        let posts: Vec<_> = table.iter().filter(|p| p.has_tag(category)).collect();

        let view = CategoryView {
            category,
            count: posts.len(),
            posts,
            template: templates::CATEGORY,
        };

        Ok(serde_json::to_string_pretty(&view)?)
    }
}
