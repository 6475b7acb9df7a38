//! In-memory content store
//!
//! The store owns every post and is the single source of truth. Nothing is
//! persisted; a fresh store starts from the seed posts.

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::blog::types::Post;

/// Posts in insertion order.
///
/// IDs are `len + 1` at insertion time and there is no deletion path, so they
/// stay unique for the lifetime of the table.
#[derive(Debug, Clone, Default)]
pub struct PostTable {
    posts: Vec<Post>,
}

impl PostTable {
    pub fn get(&self, post_id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    pub fn get_mut(&mut self, post_id: &str) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.get(post_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter()
    }

    pub fn as_slice(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Append a post under the next sequential ID and return that ID
    pub fn insert(&mut self, title: String, content: String, tags: Vec<String>) -> String {
        let post_id = (self.posts.len() + 1).to_string();
        self.posts.push(Post::new(post_id.clone(), title, content, tags));
        post_id
    }
}

/// Shared handle to the post table
#[derive(Debug, Default)]
pub struct ContentStore {
    table: RwLock<PostTable>,
}

impl ContentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the three demo posts
    pub fn seeded() -> Self {
        let mut table = PostTable::default();
        for (title, content, tags) in SEED_POSTS {
            table.insert(
                title.to_string(),
                content.to_string(),
                tags.iter().map(|t| t.to_string()).collect(),
            );
        }

        Self {
            table: RwLock::new(table),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, PostTable> {
        self.table.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, PostTable> {
        self.table.write().await
    }

    /// Clone of a single post
    pub async fn get(&self, post_id: &str) -> Option<Post> {
        self.read().await.get(post_id).cloned()
    }

    /// Clone of every post, in store order
    pub async fn snapshot(&self) -> Vec<Post> {
        self.read().await.as_slice().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.read().await.len()
    }
}

const SEED_POSTS: [(&str, &str, &[&str]); 3] = [
    ("MCP Basics", "Learn MCP fundamentals...", &["python", "mcp"]),
    (
        "Advanced MCP",
        "Deep dive into advanced features...",
        &["advanced", "mcp"],
    ),
    (
        "FastMCP Guide",
        "Using FastMCP library...",
        &["fastmcp", "tutorial"],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_store() {
        let store = ContentStore::seeded();
        assert_eq!(store.len().await, 3);

        let first = store.get("1").await.unwrap();
        assert_eq!(first.title, "MCP Basics");
        assert_eq!(first.tags, vec!["python", "mcp"]);
        assert!(store.get("4").await.is_none());
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut table = PostTable::default();
        let a = table.insert("a".into(), "content a".into(), vec![]);
        let b = table.insert("b".into(), "content b".into(), vec![]);
        assert_eq!(a, "1");
        assert_eq!(b, "2");
        assert_eq!(table.len(), 2);
        assert!(table.contains("2"));
    }

    #[tokio::test]
    async fn test_snapshot_preserves_order() {
        let store = ContentStore::seeded();
        let ids: Vec<_> = store.snapshot().await.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
