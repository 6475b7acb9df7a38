//! HTTP transports
//!
//! Serves an `McpServer` over two HTTP flavours:
//!
//! - streamable HTTP: `POST /mcp` answers with the JSON-RPC response body
//! - legacy SSE: `GET /sse` opens an event stream whose first `endpoint` event
//!   names the URL to `POST` messages to; responses arrive as `message` events

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::Result;
use crate::mcp::server::McpServer;

pub const MCP_PATH: &str = "/mcp";
pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages";

type Sessions = Arc<Mutex<HashMap<Uuid, mpsc::UnboundedSender<String>>>>;

#[derive(Clone)]
struct HttpState {
    server: Arc<McpServer>,
    sessions: Sessions,
}

impl HttpState {
    fn new(server: Arc<McpServer>) -> Self {
        Self {
            server,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Removes its session from the map when the event stream is dropped
struct SessionGuard {
    session_id: Uuid,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        lock_sessions(&self.sessions).remove(&self.session_id);
        tracing::info!(session_id = %self.session_id, "SSE session closed");
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: Uuid,
}

/// Router exposing both HTTP transports
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route(MCP_PATH, post(handle_mcp_post))
        .route(SSE_PATH, get(handle_sse))
        .route(MESSAGES_PATH, post(handle_session_message))
        .with_state(HttpState::new(server))
}

/// Bind to `addr` and serve until the process is stopped
pub async fn serve(server: Arc<McpServer>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        server = %server.name(),
        "MCP server listening on http://{} ({} and {})",
        listener.local_addr()?,
        MCP_PATH,
        SSE_PATH
    );

    axum::serve(listener, router(server)).await?;
    Ok(())
}

async fn handle_mcp_post(State(state): State<HttpState>, body: String) -> Response {
    match state.server.handle_message(&body).await {
        Ok(Some(response)) => Json(response).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::error!("Error handling message: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn handle_sse(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4();
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    lock_sessions(&state.sessions).insert(session_id, tx);

    tracing::info!(%session_id, "SSE session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{}?session_id={}", MESSAGES_PATH, session_id));

    let guard = SessionGuard {
        session_id,
        sessions: state.sessions.clone(),
    };
    let messages = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let message = rx.recv().await?;
        let event = Event::default().event("message").data(message);
        Some((Ok::<_, Infallible>(event), (rx, guard)))
    });

    let events = stream::once(async move { Ok::<_, Infallible>(endpoint) }).chain(messages);
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn handle_session_message(
    State(state): State<HttpState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> StatusCode {
    let tx = lock_sessions(&state.sessions)
        .get(&query.session_id)
        .cloned();
    let Some(tx) = tx else {
        return StatusCode::NOT_FOUND;
    };

    let response = match state.server.handle_message(&body).await {
        Ok(Some(response)) => response,
        Ok(None) => return StatusCode::ACCEPTED,
        Err(e) => {
            tracing::error!("Error handling message: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let payload = match serde_json::to_string(&response) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Failed to serialize response: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    if tx.send(payload).is_err() {
        return StatusCode::GONE;
    }

    StatusCode::ACCEPTED
}

fn lock_sessions(
    sessions: &Sessions,
) -> std::sync::MutexGuard<'_, HashMap<Uuid, mpsc::UnboundedSender<String>>> {
    sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
