//! MCP tool registrations
//!
//! Wires the blog tool executor and the weather proxy into a registry.

use crate::blog::types::{NewPost, PublishRequest, SearchQuery, TagUpdate};
use crate::blog::Blog;
use crate::mcp::registry::{Registry, ToolOutput};
use crate::weather::{WeatherClient, WeatherQuery};

/// Register `create_post`, `publish_workflow`, `batch_update_tags` and `search_posts`
pub fn register_blog_tools(registry: &mut Registry, blog: &Blog) {
    let tools = blog.tools.clone();
    registry.tool(
        "create_post",
        "Create new post with validation",
        move |args: NewPost| {
            let tools = tools.clone();
            async move { tools.create_post(args).await.map(ToolOutput::Text) }
        },
    );

    let tools = blog.tools.clone();
    registry.tool(
        "publish_workflow",
        "Multi-step publishing workflow: validate, summarize, publish and notify subscribers",
        move |args: PublishRequest| {
            let tools = tools.clone();
            async move { tools.publish_workflow(args).await.map(ToolOutput::Text) }
        },
    );

    let tools = blog.tools.clone();
    registry.tool(
        "batch_update_tags",
        "Batch operation to add and remove tags on multiple posts",
        move |args: TagUpdate| {
            let tools = tools.clone();
            async move {
                let updated = tools.batch_update_tags(args).await?;
                Ok(ToolOutput::Text(format!(
                    "Updated tags for {} posts: {:?}",
                    updated.len(),
                    updated
                )))
            }
        },
    );

    let tools = blog.tools.clone();
    registry.tool(
        "search_posts",
        "Search posts by title, content or tag with result caching",
        move |args: SearchQuery| {
            let tools = tools.clone();
            async move { tools.search_posts(args).await.map(ToolOutput::Text) }
        },
    );
}

/// Register `get_weather`
pub fn register_weather_tools(registry: &mut Registry, client: WeatherClient) {
    registry.tool(
        "get_weather",
        "Get real current weather for a city",
        move |args: WeatherQuery| {
            let client = client.clone();
            async move { Ok(ToolOutput::Json(client.get_weather(&args.city).await)) }
        },
    );
}
