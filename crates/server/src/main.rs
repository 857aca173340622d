//! tagpurge server entry point.
//!
//! Loads configuration, opens the site store, and serves the purge tools
//! over MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tagpurge_core::purge::HookRegistry;
use tagpurge_core::{AppConfig, LiveSite, PurgeService, SiteDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let db_path = config.require_db_path()?;

    tracing::info!(blog_id = config.blog_id, db_path = %db_path.display(), "Starting tagpurge server on stdio transport");

    let db = SiteDb::open(db_path).await.context("opening site store")?;
    let site = Arc::new(LiveSite::load(db).await.context("loading site index")?);

    let service = PurgeService::new(&config, site.clone(), HookRegistry::new(), None)?;

    let handler = handler::PurgeServer::new(Arc::new(service), site);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
