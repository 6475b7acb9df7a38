//! Blog MCP Server Library
//!
//! Model Context Protocol servers for a small in-memory blog and a weather
//! API proxy, plus a client that connects to them over HTTP.

pub mod blog;
pub mod config;
pub mod error;
pub mod mcp;
pub mod weather;

pub use blog::Blog;
pub use config::Config;
pub use error::{BlogMcpError, Result};
pub use mcp::server::McpServer;
