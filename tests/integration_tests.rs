//! Integration tests for the Blog MCP Server
//!
//! Drive the blog server through JSON-RPC messages the way a client would.

use blog_mcp::{Blog, McpServer};
use serde_json::{json, Value};

/// Helper to create a JSON-RPC request
fn make_request(id: i64, method: &str, params: Option<Value>) -> Value {
    let mut request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
    });
    if let Some(p) = params {
        request["params"] = p;
    }
    request
}

async fn send(server: &McpServer, request: Value) -> Value {
    let response = server
        .handle_message(&request.to_string())
        .await
        .expect("handle_message failed")
        .expect("expected a response");
    serde_json::to_value(response).expect("Failed to serialize response")
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    send(
        server,
        make_request(10, "tools/call", Some(json!({"name": name, "arguments": arguments}))),
    )
    .await["result"]
        .clone()
}

fn tool_text(result: &Value) -> String {
    result["content"][0]["text"].as_str().unwrap_or_default().to_string()
}

async fn read_json(server: &McpServer, uri: &str) -> Value {
    let resp = send(server, make_request(20, "resources/read", Some(json!({"uri": uri})))).await;
    let text = resp["result"]["contents"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("no contents for {}: {}", uri, resp));
    serde_json::from_str(text).expect("resource body is not JSON")
}

fn server() -> McpServer {
    McpServer::blog(&Blog::without_latency())
}

mod protocol_tests {
    use super::*;

    #[tokio::test]
    async fn test_handshake() {
        let server = server();
        let resp = send(
            &server,
            make_request(
                1,
                "initialize",
                Some(json!({
                    "protocolVersion": "2024-11-05",
                    "clientInfo": {"name": "test-client", "version": "1.0.0"},
                    "capabilities": {}
                })),
            ),
        )
        .await;

        assert_eq!(resp["jsonrpc"], "2.0");
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(resp["result"]["serverInfo"]["name"], "Blog Server");

        let ack = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();
        assert!(ack.is_none());

        let pong = send(&server, make_request(2, "ping", None)).await;
        assert_eq!(pong["result"], json!({}));
    }

    #[tokio::test]
    async fn test_tool_listing_has_schemas() {
        let resp = send(&server(), make_request(1, "tools/list", None)).await;
        let tools = resp["result"]["tools"].as_array().unwrap();

        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["create_post", "publish_workflow", "batch_update_tags", "search_posts"]
        );

        for tool in tools {
            assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
        }
        let create = &tools[0]["inputSchema"]["properties"];
        assert!(create["title"].is_object());
        assert!(create["content"].is_object());
    }

    #[tokio::test]
    async fn test_resource_listing() {
        let server = server();
        let resources = send(&server, make_request(1, "resources/list", None)).await;
        assert_eq!(resources["result"]["resources"][0]["uri"], "blog://posts");

        let templates = send(&server, make_request(2, "resources/templates/list", None)).await;
        let templates: Vec<&str> = templates["result"]["resourceTemplates"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["uriTemplate"].as_str().unwrap())
            .collect();
        assert_eq!(templates, vec!["blog://post/{post_id}", "blog://category/{category}"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_result() {
        let result = call_tool(&server(), "delete_everything", json!({})).await;
        assert_eq!(result["isError"], true);
        assert_eq!(tool_text(&result), "Error: Unknown tool: delete_everything");
    }

    #[tokio::test]
    async fn test_bad_arguments_are_an_error_result() {
        let result = call_tool(&server(), "search_posts", json!({"limit": 3})).await;
        assert_eq!(result["isError"], true);
        assert!(tool_text(&result).contains("search_posts"));
    }
}

mod blog_tests {
    use super::*;

    #[tokio::test]
    async fn test_title_and_content_validation() {
        let server = server();

        let blank = call_tool(&server, "create_post", json!({"title": "   ", "content": "long enough content"})).await;
        assert_eq!(blank["isError"], true);
        assert!(tool_text(&blank).ends_with("Title cannot be empty"));

        let short = call_tool(&server, "create_post", json!({"title": "Short", "content": "123456789"})).await;
        assert_eq!(short["isError"], true);
        assert!(tool_text(&short).ends_with("Content must be at least 10 characters"));

        let ok = call_tool(&server, "create_post", json!({"title": "Exact", "content": "1234567890"})).await;
        assert!(ok.get("isError").is_none());
        assert_eq!(tool_text(&ok), "Post 'Exact' created with ID: 4");
    }

    #[tokio::test]
    async fn test_create_invalidates_cached_listing() {
        let server = server();

        let before = read_json(&server, "blog://posts").await;
        assert_eq!(before["total"], 3);
        assert_eq!(before["template"], "list_view");

        call_tool(
            &server,
            "create_post",
            json!({"title": "Fresh", "content": "Brand new content", "tags": ["news"]}),
        )
        .await;

        let after = read_json(&server, "blog://posts").await;
        assert_eq!(after["total"], 4);
        assert_eq!(after["posts"][3]["id"], "4");
        assert_eq!(after["posts"][3]["title"], "Fresh");
        assert_eq!(after["posts"][3]["tags"], json!(["news"]));
    }

    #[tokio::test]
    async fn test_single_post_and_missing_post() {
        let server = server();

        let post = read_json(&server, "blog://post/1").await;
        assert_eq!(post["id"], "1");
        assert_eq!(post["template"], "single_view");

        let resp = send(
            &server,
            make_request(5, "resources/read", Some(json!({"uri": "blog://post/nonexistent"}))),
        )
        .await;
        assert_eq!(resp["error"]["code"], -32002);
        assert!(resp["error"]["message"].as_str().unwrap().contains("nonexistent"));
    }

    #[tokio::test]
    async fn test_category_is_case_insensitive() {
        let server = server();

        let mcp = read_json(&server, "blog://category/MCP").await;
        assert_eq!(mcp["category"], "MCP");
        assert_eq!(mcp["count"], 2);
        let ids: Vec<&str> = mcp["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);

        let none = read_json(&server, "blog://category/cooking").await;
        assert_eq!(none["count"], 0);
        assert_eq!(none["posts"], json!([]));
    }

    #[tokio::test]
    async fn test_batch_update_skips_unknown_ids() {
        let server = server();

        let result = call_tool(
            &server,
            "batch_update_tags",
            json!({"post_ids": ["1", "99"], "add_tags": ["x"]}),
        )
        .await;
        assert_eq!(tool_text(&result), r#"Updated tags for 1 posts: ["1"]"#);

        let post = read_json(&server, "blog://post/1").await;
        assert_eq!(post["tags"], json!(["python", "mcp", "x"]));
        let category = read_json(&server, "blog://category/x").await;
        assert_eq!(category["count"], 1);
    }

    #[tokio::test]
    async fn test_search_limit() {
        let server = server();

        let result = call_tool(&server, "search_posts", json!({"query": "mcp", "limit": 1})).await;
        let body: Value = serde_json::from_str(&tool_text(&result)).unwrap();
        assert_eq!(body["query"], "mcp");
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
        assert_eq!(body["total_searched"], 3);

        let all = call_tool(&server, "search_posts", json!({"query": "MCP"})).await;
        let body: Value = serde_json::from_str(&tool_text(&all)).unwrap();
        assert_eq!(body["count"], 3);
    }

    #[tokio::test]
    async fn test_publish_workflow() {
        let server = server();

        let result = call_tool(&server, "publish_workflow", json!({"post_id": "2"})).await;
        let text = tool_text(&result);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Publishing workflow completed for 'Advanced MCP':"));
        assert_eq!(lines.next(), Some("- Post validated"));
        assert!(lines.next().unwrap().starts_with("- Summary generated: "));
        assert_eq!(lines.next(), Some("- Post marked as published"));
        assert_eq!(lines.next(), Some("- 150 subscribers notified"));
        assert_eq!(lines.next(), None);

        let post = read_json(&server, "blog://post/2").await;
        assert_eq!(post["status"], "published");
        assert_eq!(post["published_at"], "2024-01-01T12:00:00Z");
        assert!(post["summary"].as_str().unwrap().ends_with("..."));
    }

    #[tokio::test]
    async fn test_publish_unknown_post_leaves_store_unchanged() {
        let server = server();
        let before = read_json(&server, "blog://posts").await;

        let result = call_tool(&server, "publish_workflow", json!({"post_id": "404"})).await;
        assert_eq!(result["isError"], true);
        assert_eq!(tool_text(&result), "Error: Post 404 not found");

        let after = read_json(&server, "blog://posts").await;
        assert_eq!(before, after);
    }
}
