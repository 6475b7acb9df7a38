//! Query cache
//!
//! Pre-serialized query results keyed by the query that produced them.
//! Entries expire after a fixed TTL, the cache is capacity-bounded, and any
//! write to the content store clears it entirely.

use std::fmt;

use moka::sync::Cache;

use crate::config::CacheSettings;

/// Logical query a cached result belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AllPosts,
    Post(String),
    Search { query: String, limit: usize },
}

impl CacheKey {
    pub fn post(post_id: impl Into<String>) -> Self {
        Self::Post(post_id.into())
    }

    /// Search key; the query is folded to lowercase
    pub fn search(query: &str, limit: usize) -> Self {
        Self::Search {
            query: query.to_lowercase(),
            limit,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllPosts => f.write_str("all_posts"),
            Self::Post(id) => write!(f, "post_{}", id),
            Self::Search { query, limit } => write!(f, "search_{}_{}", query, limit),
        }
    }
}

/// TTL + LRU cache of serialized query results
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<String, String>,
}

impl QueryCache {
    pub fn new(settings: CacheSettings) -> Self {
        let inner = Cache::builder()
            .max_capacity(settings.max_entries)
            .time_to_live(settings.ttl)
            .build();

        Self { inner }
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let hit = self.inner.get(&key.to_string());
        tracing::debug!(key = %key, hit = hit.is_some(), "cache lookup");
        hit
    }

    pub fn insert(&self, key: &CacheKey, value: String) {
        self.inner.insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.contains_key(&key.to_string())
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inner.invalidate_all();
        tracing::debug!("cache cleared");
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}
