//! favicon-mcp server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use prefixer_client::FaviconPrefixer;
use prefixer_core::{AppConfig, CacheDb, Settings};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    let db = CacheDb::open(&config.db_path).await?;
    let settings = Settings::load(&db).await.unwrap_or_default();

    let default_level = if settings.debug_mode { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!("Starting favicon-mcp server on stdio transport");

    let app = FaviconPrefixer::from_db(config, db).await?;
    let handler = handler::FaviconMcpServer::new(app);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
