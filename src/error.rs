//! Error types for the blog MCP server
//!
//! This module defines the error hierarchy for all operations in the crate.

use thiserror::Error;

/// Main error type for the blog MCP server
#[derive(Error, Debug)]
pub enum BlogMcpError {
    /// Bad input shape or length
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown identifier
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// Failure talking to a third-party service
    #[error("External service error: {0}")]
    ExternalService(#[from] ExternalServiceError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Content must be at least {min} characters")]
    ContentTooShort { min: usize },

    #[error("Invalid parameter: {name} - {message}")]
    InvalidParameter { name: String, message: String },
}

/// Lookup errors for unknown identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("Post {post_id} not found")]
    Post { post_id: String },

    #[error("Resource not found: {uri}")]
    Resource { uri: String },

    #[error("Unknown tool: {name}")]
    Tool { name: String },
}

/// External service errors
#[derive(Error, Debug)]
pub enum ExternalServiceError {
    #[error("Request failed ({status}): {body}")]
    Status { status: u16, body: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Server '{name}' not found in config")]
    UnknownServer { name: String },

    #[error("Unsupported transport: {transport}")]
    UnsupportedTransport { transport: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Server returned error {code}: {message}")]
    Remote { code: i32, message: String },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },
}

/// Result type alias for blog MCP operations
pub type Result<T> = std::result::Result<T, BlogMcpError>;

impl BlogMcpError {
    /// Whether this error is a failed lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogMcpError::NotFound(_))
    }

    /// Whether this error is an input validation failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BlogMcpError::Validation(_) | BlogMcpError::Mcp(McpError::InvalidArguments { .. })
        )
    }
}
