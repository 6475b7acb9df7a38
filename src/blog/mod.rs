//! Blog content module
//!
//! Contains the content store, the query cache, and the resource and tool
//! surfaces built on top of them.

pub mod cache;
pub mod resources;
pub mod store;
pub mod tools;
pub mod types;

use std::sync::Arc;

use crate::config::{CacheSettings, Latency};

pub use cache::{CacheKey, QueryCache};
pub use resources::ResourceProvider;
pub use store::ContentStore;
pub use tools::ToolExecutor;

/// A content store together with its cache and the two surfaces over it
#[derive(Debug, Clone)]
pub struct Blog {
    pub store: Arc<ContentStore>,
    pub cache: QueryCache,
    pub resources: ResourceProvider,
    pub tools: ToolExecutor,
}

impl Blog {
    pub fn new(store: ContentStore, cache: CacheSettings, latency: Latency) -> Self {
        let store = Arc::new(store);
        let cache = QueryCache::new(cache);

        Self {
            resources: ResourceProvider::new(store.clone(), cache.clone()),
            tools: ToolExecutor::new(store.clone(), cache.clone(), latency),
            store,
            cache,
        }
    }

    /// Seeded blog with no simulated latency
    pub fn without_latency() -> Self {
        Self::new(ContentStore::seeded(), CacheSettings::default(), Latency::none())
    }
}
