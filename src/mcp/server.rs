//! MCP Server implementation
//!
//! Dispatches JSON-RPC messages to the registry. The dispatcher is transport
//! agnostic; `run_stdio` drives it over stdin/stdout and `mcp::http` serves
//! it over HTTP.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::blog::Blog;
use crate::config;
use crate::error::{BlogMcpError, Result};
use crate::mcp::registry::{Registry, JSON_MIME_TYPE};
use crate::mcp::resources::register_blog_resources;
use crate::mcp::tools::{register_blog_tools, register_weather_tools};
use crate::mcp::types::*;
use crate::weather::WeatherClient;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server over a tool/resource registry
pub struct McpServer {
    name: String,

    registry: Arc<Registry>,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(name: impl Into<String>, registry: Registry) -> Self {
        Self {
            name: name.into(),
            registry: Arc::new(registry),
        }
    }

    /// Server exposing the blog resources and tools
    pub fn blog(blog: &Blog) -> Self {
        let mut registry = Registry::new();
        register_blog_resources(&mut registry, blog);
        register_blog_tools(&mut registry, blog);
        Self::new(config::blog::SERVER_NAME, registry)
    }

    /// Server exposing the weather proxy
    pub fn weather(client: WeatherClient) -> Self {
        let mut registry = Registry::new();
        register_weather_tools(&mut registry, client);
        Self::new(config::weather::SERVER_NAME, registry)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the server on stdio until stdin closes
    pub async fn run_stdio(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        tracing::info!(server = %self.name, "MCP server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            match self.handle_message(&line).await {
                Ok(Some(response)) => {
                    let mut response_str = serde_json::to_string(&response)?;
                    response_str.push('\n');
                    stdout.write_all(response_str.as_bytes()).await?;
                    stdout.flush().await?;
                }
                Ok(None) => {
                    // Notification, no response needed
                }
                Err(e) => {
                    tracing::error!("Error handling message: {}", e);
                }
            }
        }

        tracing::info!("Client closed connection");
        Ok(())
    }

    /// Handle an incoming JSON-RPC message
    pub async fn handle_message(&self, message: &str) -> Result<Option<JsonRpcResponse>> {
        let raw: Value = match serde_json::from_str(message) {
            Ok(raw) => raw,
            Err(e) => {
                return Ok(Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                )));
            }
        };

        // Well-formed JSON that is not a request still gets its id echoed back
        let raw_id = raw
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(req) => req,
            Err(e) => {
                return Ok(Some(JsonRpcResponse::error(
                    raw_id,
                    JsonRpcError::invalid_request(e.to_string()),
                )));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Ok(Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(format!(
                    "unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            )));
        }

        tracing::debug!(method = %request.method, "received request");

        if request.is_notification() {
            if request.method == methods::INITIALIZED {
                tracing::debug!("client finished initialization");
            }
            return Ok(None);
        }

        let id = request.id.clone();
        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(&request),
            methods::PING => Ok(serde_json::json!({})),
            methods::LIST_TOOLS => to_result(&ListToolsResult {
                tools: self.registry.list_tools(),
            }),
            methods::CALL_TOOL => self.handle_call_tool(request.params).await,
            methods::LIST_RESOURCES => to_result(&ListResourcesResult {
                resources: self.registry.list_resources(),
            }),
            methods::LIST_RESOURCE_TEMPLATES => to_result(&ListResourceTemplatesResult {
                resource_templates: self.registry.list_resource_templates(),
            }),
            methods::READ_RESOURCE => self.handle_read_resource(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Ok(Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        }))
    }

    /// Handle initialize request
    fn handle_initialize(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        if let Some(params) = &request.params {
            if let Ok(params) = serde_json::from_value::<InitializeParams>(params.clone()) {
                tracing::info!(
                    client = %params.client_info.name,
                    version = %params.client_info.version,
                    protocol = %params.protocol_version,
                    "client connected"
                );
            }
        }

        let resources = self
            .registry
            .has_resources()
            .then(ResourcesCapability::default);

        to_result(&InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: self.name.clone(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                resources,
            },
        })
    }

    /// Handle call tool request; tool failures are reported in the result
    async fn handle_call_tool(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tool parameters: {}", e)))?;

        tracing::info!(tool = %params.name, "tool call");

        let result = match self.registry.call_tool(&params.name, params.arguments).await {
            Ok(output) => CallToolResult::text(output.into_text()),
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "tool call failed");
                CallToolResult::error(e.to_string())
            }
        };

        to_result(&result)
    }

    /// Handle resource read; failures become JSON-RPC errors
    async fn handle_read_resource(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: ReadResourceParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid resource parameters: {}", e)))?;

        let text = self
            .registry
            .read_resource(&params.uri)
            .await
            .map_err(|e| match &e {
                BlogMcpError::NotFound(_) => JsonRpcError::resource_not_found(&params.uri, e.to_string()),
                _ if e.is_validation() => JsonRpcError::invalid_params(e.to_string()),
                _ => JsonRpcError::internal_error(e.to_string()),
            })?;

        to_result(&ReadResourceResult {
            contents: vec![ResourceContent {
                uri: params.uri,
                text: Some(text),
                blob: None,
                mime_type: Some(JSON_MIME_TYPE.to_string()),
            }],
        })
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::internal_error(format!("Failed to serialize result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server() -> McpServer {
        McpServer::blog(&Blog::without_latency())
    }

    async fn call(server: &McpServer, request: Value) -> Value {
        let response = server
            .handle_message(&request.to_string())
            .await
            .unwrap()
            .unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn test_server_info() {
        assert_eq!(server().name(), "Blog Server");
    }

    #[tokio::test]
    async fn test_initialize_advertises_resources() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": MCP_VERSION,
                "clientInfo": {"name": "test", "version": "0.0.1"},
                "capabilities": {}
            }}),
        )
        .await;

        assert_eq!(resp["result"]["serverInfo"]["name"], "Blog Server");
        assert!(resp["result"]["capabilities"]["resources"].is_object());
        assert!(resp["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_weather_server_has_no_resources_capability() {
        let server = McpServer::weather(WeatherClient::new("http://localhost", None));
        let resp = call(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
        assert!(resp["result"]["capabilities"].get("resources").is_none());
    }

    #[tokio::test]
    async fn test_initialized_notification_gets_no_response() {
        let server = server();
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();
        assert!(resp.is_none());

        let pong = call(&server, json!({"jsonrpc": "2.0", "id": 9, "method": "ping"})).await;
        assert_eq!(pong["result"], json!({}));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let resp = server().handle_message("{not json").await.unwrap().unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::PARSE_ERROR);
        assert!(resp.id.is_none());
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let missing_version = call(&server(), json!({"id": 7, "method": "ping"})).await;
        assert_eq!(missing_version["id"], 7);
        assert_eq!(missing_version["error"]["code"], JsonRpcError::INVALID_REQUEST);

        let wrong_version = call(&server(), json!({"jsonrpc": "1.0", "id": 8, "method": "ping"})).await;
        assert_eq!(wrong_version["id"], 8);
        assert_eq!(wrong_version["error"]["code"], JsonRpcError::INVALID_REQUEST);

        let not_an_object = call(&server(), json!([1, 2, 3])).await;
        assert!(not_an_object["id"].is_null());
        assert_eq!(not_an_object["error"]["code"], JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let resp = call(&server(), json!({"jsonrpc": "2.0", "id": "a", "method": "prompts/list"})).await;
        assert_eq!(resp["id"], "a");
        assert_eq!(resp["error"]["code"], JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tool_error_is_reported_in_result() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {
                "name": "publish_workflow",
                "arguments": {"post_id": "404"}
            }}),
        )
        .await;

        assert_eq!(resp["result"]["isError"], true);
        assert_eq!(resp["result"]["content"][0]["text"], "Error: Post 404 not found");
    }

    #[tokio::test]
    async fn test_read_missing_resource() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 3, "method": "resources/read", "params": {
                "uri": "blog://post/nonexistent"
            }}),
        )
        .await;

        assert_eq!(resp["error"]["code"], JsonRpcError::RESOURCE_NOT_FOUND);
        assert_eq!(resp["error"]["data"]["uri"], "blog://post/nonexistent");
    }

    #[tokio::test]
    async fn test_read_resource_contents() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 4, "method": "resources/read", "params": {
                "uri": "blog://posts"
            }}),
        )
        .await;

        let content = &resp["result"]["contents"][0];
        assert_eq!(content["uri"], "blog://posts");
        assert_eq!(content["mimeType"], "application/json");
        let body: Value = serde_json::from_str(content["text"].as_str().unwrap()).unwrap();
        assert_eq!(body["total"], 3);
    }
}
