//! Blog MCP Server - Rust Implementation
//!
//! Runs the blog content server, the weather proxy server, or a client that
//! connects to one of them and calls a tool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use blog_mcp::blog::{Blog, ContentStore};
use blog_mcp::config::{self, ClientConfig, Config};
use blog_mcp::mcp::client::McpClient;
use blog_mcp::mcp::http;
use blog_mcp::mcp::server::McpServer;
use blog_mcp::weather::WeatherClient;

/// Blog MCP Server
#[derive(Parser)]
#[command(name = "blog-mcp")]
#[command(author, version, about = "Blog MCP Server - Model Context Protocol servers for blog content and weather")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the blog content server
    Serve {
        #[arg(long, value_enum, default_value_t = ServeTransport::Stdio)]
        transport: ServeTransport,

        #[command(flatten)]
        bind: BindArgs,
    },

    /// Run the weather proxy server
    Weather {
        #[arg(long, value_enum, default_value_t = ServeTransport::Http)]
        transport: ServeTransport,

        #[command(flatten)]
        bind: BindArgs,
    },

    /// Connect to a configured server and call a tool
    Client {
        /// Path to the client config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Server name under `mcpServers`
        #[arg(long, default_value = config::client::DEFAULT_SERVER)]
        server: String,

        /// Tool to call
        #[arg(long, default_value = "get_weather")]
        tool: String,

        /// City passed to the tool
        #[arg(long, default_value = "NEW DELHI")]
        city: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ServeTransport {
    /// Newline-delimited JSON-RPC over stdin/stdout
    Stdio,
    /// Streamable HTTP and SSE endpoints
    Http,
}

#[derive(clap::Args)]
struct BindArgs {
    /// Overrides BLOG_MCP_HOST
    #[arg(long)]
    host: Option<String>,

    /// Overrides BLOG_MCP_PORT
    #[arg(long)]
    port: Option<u16>,
}

impl BindArgs {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::new()?;

    match cli.command {
        Commands::Serve { transport, bind } => {
            bind.apply(&mut config);
            let blog = Blog::new(ContentStore::seeded(), config.cache, config.latency);
            run_server(McpServer::blog(&blog), transport, &config).await?;
        }
        Commands::Weather { transport, bind } => {
            bind.apply(&mut config);
            let server = McpServer::weather(WeatherClient::from_config(&config));
            run_server(server, transport, &config).await?;
        }
        Commands::Client {
            config: path,
            server,
            tool,
            city,
        } => {
            let path = path.unwrap_or_else(ClientConfig::default_path);
            run_client(path, &server, &tool, &city).await?;
        }
    }

    Ok(())
}

async fn run_server(server: McpServer, transport: ServeTransport, config: &Config) -> anyhow::Result<()> {
    match transport {
        ServeTransport::Stdio => server.run_stdio().await?,
        ServeTransport::Http => http::serve(Arc::new(server), &config.bind_addr()).await?,
    }
    Ok(())
}

async fn run_client(path: PathBuf, server: &str, tool: &str, city: &str) -> anyhow::Result<()> {
    let client_config = ClientConfig::load(&path)
        .with_context(|| format!("failed to load client config from {}", path.display()))?;
    let entry = client_config.server(server)?;

    let client = McpClient::connect(entry)
        .await
        .with_context(|| format!("failed to connect to '{}' at {}", server, entry.url))?;
    println!("Connected to MCP server!");

    let tools = client.list_tools().await?;
    println!("Available tools:");
    for t in &tools {
        println!("  • {}: {}", t.name, t.description.as_deref().unwrap_or(""));
    }

    let result = client.call_tool(tool, json!({ "city": city })).await?;
    println!("Result: {}", result.joined_text());

    Ok(())
}
