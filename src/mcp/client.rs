//! MCP client
//!
//! Connects to a server over streamable HTTP or the legacy SSE transport,
//! performs the initialize handshake and issues tool and resource calls.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::{ServerEntry, TransportKind};
use crate::error::{BlogMcpError, ConfigError, McpError, Result};
use crate::mcp::sse::EventParser;
use crate::mcp::types::*;

const CLIENT_NAME: &str = "blog-mcp-client";
const SESSION_HEADER: &str = "mcp-session-id";

/// MCP client bound to one server
pub struct McpClient {
    transport: Transport,
    next_id: AtomicI64,
    server: Option<InitializeResult>,
}

impl McpClient {
    /// Connect to the server described by `entry` and run the handshake
    pub async fn connect(entry: &ServerEntry) -> Result<Self> {
        let transport = match entry.transport {
            TransportKind::StreamableHttp => Transport::Http(HttpTransport::new(&entry.url)),
            TransportKind::Sse => Transport::Sse(SseTransport::connect(&entry.url).await?),
            TransportKind::Stdio => {
                return Err(ConfigError::UnsupportedTransport {
                    transport: entry.transport.to_string(),
                }
                .into())
            }
        };

        let mut client = Self {
            transport,
            next_id: AtomicI64::new(1),
            server: None,
        };
        client.initialize().await?;

        tracing::info!(url = %entry.url, transport = %entry.transport, "connected to MCP server");
        Ok(client)
    }

    /// Server info reported during the handshake
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server.as_ref().map(|s| &s.server_info)
    }

    async fn initialize(&mut self) -> Result<()> {
        let params = InitializeParams {
            protocol_version: MCP_VERSION.to_string(),
            client_info: ClientInfo {
                name: CLIENT_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: serde_json::json!({}),
        };

        let result: InitializeResult = self
            .request(methods::INITIALIZE, Some(serde_json::to_value(params)?))
            .await?;
        self.transport
            .send(&JsonRpcRequest::notification(methods::INITIALIZED))
            .await?;

        self.server = Some(result);
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        let _: Value = self.request(methods::PING, None).await?;
        Ok(())
    }

    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result: ListToolsResult = self.request(methods::LIST_TOOLS, None).await?;
        Ok(result.tools)
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        self.request(methods::CALL_TOOL, Some(serde_json::to_value(params)?))
            .await
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        let result: ListResourcesResult = self.request(methods::LIST_RESOURCES, None).await?;
        Ok(result.resources)
    }

    pub async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>> {
        let result: ListResourceTemplatesResult = self
            .request(methods::LIST_RESOURCE_TEMPLATES, None)
            .await?;
        Ok(result.resource_templates)
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        let params = ReadResourceParams {
            uri: uri.to_string(),
        };
        self.request(methods::READ_RESOURCE, Some(serde_json::to_value(params)?))
            .await
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> Result<T> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = JsonRpcRequest::new(id, method, params);

        let response = self.transport.send(&request).await?.ok_or_else(|| {
            protocol_error(format!("no response to {}", method))
        })?;

        if let Some(error) = response.error {
            return Err(McpError::Remote {
                code: error.code,
                message: error.message,
            }
            .into());
        }

        let result = response
            .result
            .ok_or_else(|| protocol_error(format!("response to {} has no result", method)))?;
        Ok(serde_json::from_value(result)?)
    }
}

enum Transport {
    Http(HttpTransport),
    Sse(SseTransport),
}

impl Transport {
    async fn send(&self, message: &JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        match self {
            Transport::Http(http) => http.send(message).await,
            Transport::Sse(sse) => sse.send(message).await,
        }
    }
}

/// Streamable HTTP: one POST per message
struct HttpTransport {
    http_client: reqwest::Client,
    url: String,
    session_id: Mutex<Option<String>>,
}

impl HttpTransport {
    fn new(url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url: url.to_string(),
            session_id: Mutex::new(None),
        }
    }

    fn session_id(&self) -> Option<String> {
        self.session_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn send(&self, message: &JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        let mut request = self
            .http_client
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(message);
        if let Some(session_id) = self.session_id() {
            request = request.header(SESSION_HEADER, session_id);
        }

        let response = request.send().await?;

        if let Some(session_id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self
                .session_id
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session_id.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(transport_error(format!("HTTP {}: {}", status, text)));
        }
        if message.is_notification() || status == StatusCode::ACCEPTED {
            return Ok(None);
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        let body = response.text().await?;

        if !is_event_stream {
            return Ok(Some(serde_json::from_str(&body)?));
        }

        let mut parser = EventParser::new();
        let mut events = parser.feed(body.as_bytes());
        events.extend(parser.finish());

        events
            .into_iter()
            .filter_map(|event| serde_json::from_str::<JsonRpcResponse>(&event.data).ok())
            .find(|response| response.id == message.id)
            .map(Some)
            .ok_or_else(|| protocol_error("event stream ended without a response"))
    }
}

/// Legacy SSE: a long-lived GET stream for responses, POSTs for requests
struct SseTransport {
    http_client: reqwest::Client,
    endpoint: Url,
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    reader: JoinHandle<()>,
}

impl SseTransport {
    async fn connect(url: &str) -> Result<Self> {
        let http_client = reqwest::Client::new();
        let response = http_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(transport_error(format!(
                "SSE connection failed: HTTP {}",
                response.status()
            )));
        }

        let base = response.url().clone();
        let (endpoint_tx, endpoint_rx) = oneshot::channel();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_event_stream(response, endpoint_tx, inbox_tx));

        let endpoint = endpoint_rx
            .await
            .map_err(|_| transport_error("event stream closed before the endpoint event"))?;
        let endpoint = base
            .join(&endpoint)
            .map_err(|e| transport_error(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        tracing::debug!(%endpoint, "SSE endpoint received");

        Ok(Self {
            http_client,
            endpoint,
            inbox: tokio::sync::Mutex::new(inbox_rx),
            reader,
        })
    }

    async fn send(&self, message: &JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        // Held for the whole exchange so each response pairs with its request
        let mut inbox = self.inbox.lock().await;

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(transport_error(format!("HTTP {}: {}", status, text)));
        }

        let Some(id) = &message.id else {
            return Ok(None);
        };

        loop {
            let raw = inbox
                .recv()
                .await
                .ok_or_else(|| transport_error("event stream closed"))?;

            match serde_json::from_str::<JsonRpcResponse>(&raw) {
                Ok(response) if response.id.as_ref() == Some(id) => return Ok(Some(response)),
                Ok(_) => tracing::debug!("ignoring response for another request"),
                Err(e) => tracing::debug!("ignoring unparseable message: {}", e),
            }
        }
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_event_stream(
    response: reqwest::Response,
    endpoint_tx: oneshot::Sender<String>,
    inbox: mpsc::UnboundedSender<String>,
) {
    let mut endpoint_tx = Some(endpoint_tx);
    let mut parser = EventParser::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!("SSE stream error: {}", e);
                return;
            }
        };

        for event in parser.feed(&chunk) {
            match event.event.as_deref() {
                Some("endpoint") => {
                    if let Some(tx) = endpoint_tx.take() {
                        let _ = tx.send(event.data);
                    }
                }
                Some("message") | None => {
                    if inbox.send(event.data).is_err() {
                        return;
                    }
                }
                Some(other) => tracing::debug!("ignoring SSE event '{}'", other),
            }
        }
    }
}

fn transport_error(message: impl Into<String>) -> BlogMcpError {
    McpError::TransportError {
        message: message.into(),
    }
    .into()
}

fn protocol_error(message: impl Into<String>) -> BlogMcpError {
    McpError::ProtocolError {
        message: message.into(),
    }
    .into()
}
