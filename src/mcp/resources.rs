//! MCP resource registrations for the blog

use crate::blog::Blog;
use crate::error::{McpError, Result};
use crate::mcp::registry::{Registry, ResourceParams};

pub const POSTS_URI: &str = "blog://posts";
pub const POST_URI_TEMPLATE: &str = "blog://post/{post_id}";
pub const CATEGORY_URI_TEMPLATE: &str = "blog://category/{category}";

/// Register the listing, single-post and category resources
pub fn register_blog_resources(registry: &mut Registry, blog: &Blog) {
    let resources = blog.resources.clone();
    registry.resource(POSTS_URI, "posts", "List all posts", move || {
        let resources = resources.clone();
        async move { resources.list_all().await }
    });

    let resources = blog.resources.clone();
    registry.resource_template(
        POST_URI_TEMPLATE,
        "post",
        "Get a single post by ID",
        move |params| {
            let resources = resources.clone();
            async move {
                let post_id = param(&params, "post_id")?;
                resources.get_one(&post_id).await
            }
        },
    );

    let resources = blog.resources.clone();
    registry.resource_template(
        CATEGORY_URI_TEMPLATE,
        "category",
        "Filter posts by category (tag, case-insensitive)",
        move |params| {
            let resources = resources.clone();
            async move {
                let category = param(&params, "category")?;
                resources.list_by_category(&category).await
            }
        },
    );
}

fn param(params: &ResourceParams, name: &str) -> Result<String> {
    params.get(name).cloned().ok_or_else(|| {
        McpError::InvalidArguments {
            message: format!("missing URI parameter: {}", name),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        register_blog_resources(&mut registry, &Blog::without_latency());
        registry
    }

    #[test]
    fn test_resource_listing() {
        let registry = registry();
        assert_eq!(registry.list_resources()[0].uri, POSTS_URI);

        let templates: Vec<_> = registry
            .list_resource_templates()
            .into_iter()
            .map(|t| t.uri_template)
            .collect();
        assert_eq!(templates, vec![POST_URI_TEMPLATE, CATEGORY_URI_TEMPLATE]);
    }

    #[tokio::test]
    async fn test_read_single_post() {
        let text = registry().read_resource("blog://post/3").await.unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["title"], "FastMCP Guide");
    }

    #[tokio::test]
    async fn test_read_category() {
        let text = registry().read_resource("blog://category/Tutorial").await.unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["posts"][0]["id"], "3");
    }

    #[tokio::test]
    async fn test_read_missing_post() {
        let err = registry().read_resource("blog://post/nonexistent").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
