//! Configuration management for the blog and weather MCP servers
//!
//! Server settings come from environment variables (with defaults); the
//! client reads a JSON file naming the servers it can connect to.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BlogMcpError, ConfigError, Result};

/// Configuration for the MCP servers
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP transport binds to
    pub host: String,

    /// Port the HTTP transport binds to
    pub port: u16,

    /// Base URL of the weather API
    pub weather_api_url: String,

    /// RapidAPI key for the weather API
    pub weather_api_key: Option<String>,

    /// Query cache sizing
    pub cache: CacheSettings,

    /// Simulated delays used by the blog tools
    pub latency: Latency,
}

impl Config {
    /// Create a new configuration from the process environment
    pub fn new() -> Result<Self> {
        let host = std::env::var("BLOG_MCP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = match std::env::var("BLOG_MCP_PORT") {
            Ok(p) => p.parse().map_err(|_| {
                BlogMcpError::Config(ConfigError::InvalidConfig {
                    message: format!("BLOG_MCP_PORT is not a valid port: {}", p),
                })
            })?,
            Err(_) => 8000,
        };

        let weather_api_url = std::env::var("WEATHER_API_URL")
            .unwrap_or_else(|_| weather::DEFAULT_API_URL.to_string());

        let weather_api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());

        Ok(Self {
            host,
            port,
            weather_api_url,
            weather_api_key,
            cache: CacheSettings::default(),
            latency: Latency::default(),
        })
    }

    /// Socket address string for the HTTP transport
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Capacity and lifetime of the query cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub max_entries: u64,
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: blog::CACHE_MAX_ENTRIES,
            ttl: Duration::from_secs(blog::CACHE_TTL_SECS),
        }
    }
}

/// Simulated processing delays for the blog tools.
///
/// These stand in for real I/O; `Latency::none()` turns every one of them
/// into a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub validate: Duration,
    pub summarize: Duration,
    pub notify: Duration,
    pub tag_update: Duration,
}

impl Latency {
    /// No simulated delays at all
    pub fn none() -> Self {
        Self {
            validate: Duration::ZERO,
            summarize: Duration::ZERO,
            notify: Duration::ZERO,
            tag_update: Duration::ZERO,
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            validate: Duration::from_millis(100),
            summarize: Duration::from_millis(100),
            notify: Duration::from_millis(100),
            tag_update: Duration::from_millis(50),
        }
    }
}

/// Transport used to reach an MCP server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Legacy HTTP+SSE transport (`GET /sse`, `POST /messages`)
    Sse,
    /// Streamable HTTP transport (`POST /mcp`)
    StreamableHttp,
    /// Newline-delimited JSON over stdin/stdout
    Stdio,
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sse" => Ok(Self::Sse),
            "http" | "streamable-http" | "streamable_http" => Ok(Self::StreamableHttp),
            "stdio" => Ok(Self::Stdio),
            other => Err(ConfigError::UnsupportedTransport {
                transport: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sse => "sse",
            Self::StreamableHttp => "streamable-http",
            Self::Stdio => "stdio",
        };
        f.write_str(name)
    }
}

/// One entry under `mcpServers` in the client config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub url: String,
    pub transport: TransportKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfigFile {
    #[serde(default)]
    mcp_servers: HashMap<String, RawServerEntry>,
}

#[derive(Debug, Deserialize)]
struct RawServerEntry {
    url: String,
    transport: Option<String>,
}

/// Client-side configuration: the servers named in a config file
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    servers: HashMap<String, ServerEntry>,
}

impl ClientConfig {
    /// Load the config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse the config from a JSON document
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: ClientConfigFile = serde_json::from_str(raw)?;

        let mut servers = HashMap::with_capacity(file.mcp_servers.len());
        for (name, entry) in file.mcp_servers {
            let transport = match entry.transport.as_deref() {
                Some(t) => t.parse()?,
                None => TransportKind::Sse,
            };
            servers.insert(
                name,
                ServerEntry {
                    url: entry.url,
                    transport,
                },
            );
        }

        Ok(Self { servers })
    }

    /// Look up a server by name
    pub fn server(&self, name: &str) -> Result<&ServerEntry> {
        self.servers.get(name).ok_or_else(|| {
            ConfigError::UnknownServer {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Locate the config file: `./server.json`, then `~/.blog-mcp/server.json`
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(client::CONFIG_FILE_NAME);
        if local.exists() {
            return local;
        }

        dirs::home_dir()
            .map(|home| home.join(client::CONFIG_DIR_NAME).join(client::CONFIG_FILE_NAME))
            .filter(|p| p.exists())
            .unwrap_or(local)
    }
}

/// Blog server constants
pub mod blog {
    pub const SERVER_NAME: &str = "Blog Server";
    pub const CACHE_MAX_ENTRIES: u64 = 50;
    pub const CACHE_TTL_SECS: u64 = 300;
}

/// Weather API constants
pub mod weather {
    pub const SERVER_NAME: &str = "Real Weather Server";
    pub const DEFAULT_API_URL: &str = "https://weather-api167.p.rapidapi.com";
    pub const CURRENT_WEATHER_PATH: &str = "/api/weather/current";
    pub const API_HOST: &str = "weather-api167.p.rapidapi.com";
    pub const COUNTRY_CODE: &str = "IN";
}

/// Client constants
pub mod client {
    pub const CONFIG_FILE_NAME: &str = "server.json";
    pub const CONFIG_DIR_NAME: &str = ".blog-mcp";
    pub const DEFAULT_SERVER: &str = "weather-mcp";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = Config::new();
        assert!(config.is_ok());
    }

    #[test]
    fn test_default_cache_settings() {
        let settings = CacheSettings::default();
        assert_eq!(settings.max_entries, 50);
        assert_eq!(settings.ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_client_config_defaults_to_sse() {
        let config = ClientConfig::from_json(
            r#"{"mcpServers": {"weather-mcp": {"url": "http://127.0.0.1:8000/sse"}}}"#,
        )
        .unwrap();

        let entry = config.server("weather-mcp").unwrap();
        assert_eq!(entry.url, "http://127.0.0.1:8000/sse");
        assert_eq!(entry.transport, TransportKind::Sse);
    }

    #[test]
    fn test_client_config_explicit_transport() {
        let config = ClientConfig::from_json(
            r#"{"mcpServers": {"blog": {"url": "http://localhost:8000/mcp", "transport": "streamable-http"}}}"#,
        )
        .unwrap();

        assert_eq!(
            config.server("blog").unwrap().transport,
            TransportKind::StreamableHttp
        );
    }

    #[test]
    fn test_shipped_client_config_uses_distinct_ports() {
        let config = ClientConfig::from_json(include_str!("../server.json")).unwrap();
        let weather = config.server("weather-mcp").unwrap();
        let blog = config.server("blog-mcp").unwrap();

        assert_eq!(weather.transport, TransportKind::Sse);
        assert_eq!(blog.transport, TransportKind::StreamableHttp);

        let authority = |url: &str| url.split('/').nth(2).unwrap_or_default().to_string();
        assert_ne!(authority(&weather.url), authority(&blog.url));
    }

    #[test]
    fn test_client_config_unknown_server() {
        let config = ClientConfig::from_json(r#"{"mcpServers": {}}"#).unwrap();
        let err = config.server("weather-mcp").unwrap_err();
        assert!(matches!(
            err,
            BlogMcpError::Config(ConfigError::UnknownServer { .. })
        ));
    }

    #[test]
    fn test_client_config_bad_transport() {
        let result = ClientConfig::from_json(
            r#"{"mcpServers": {"x": {"url": "http://h", "transport": "carrier-pigeon"}}}"#,
        );
        assert!(matches!(
            result,
            Err(BlogMcpError::Config(ConfigError::UnsupportedTransport { .. }))
        ));
    }

    #[test]
    fn test_client_config_missing_file() {
        let result = ClientConfig::load("/definitely/not/here/server.json");
        assert!(matches!(
            result,
            Err(BlogMcpError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
