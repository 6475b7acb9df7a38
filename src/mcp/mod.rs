//! MCP (Model Context Protocol) module
//!
//! JSON-RPC protocol types, the tool/resource registry, the server with its
//! stdio and HTTP transports, and a client for the HTTP transports.

pub mod client;
pub mod http;
pub mod registry;
pub mod resources;
pub mod server;
pub mod sse;
pub mod tools;
pub mod types;
