//! MCP server binary entry point.

use anyhow::{Context, Result};
use lifespan_mcp::{
    config::{DatabaseConfigBuilder, ServerConfig},
    protocol::{McpServerBuilder, ShutdownHandle},
    server::{AppLifespan, McpHandler, app_state},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let database = DatabaseConfigBuilder::new()
        .from_env()?
        .build()
        .context("invalid database configuration")?;
    let config = ServerConfig::builder()
        .from_env()
        .database(database)
        .build()?;

    let lifespan = AppLifespan::new(config.database.clone());
    let name = config.name.to_string();
    let state = Arc::new(app_state(config)?);

    info!(
        "Server state initialized with {} tools, {} resources, {} prompts",
        state.tools.len(),
        state.resources.len(),
        state.prompts.len()
    );

    let server = McpServerBuilder::new()
        .handler(McpHandler::new(state))
        .lifespan(lifespan)
        .name(name)
        .version(env!("CARGO_PKG_VERSION"))
        .build()?;

    tokio::spawn(shutdown_on_ctrl_c(server.shutdown_handle()));

    info!("MCP server ready, waiting for connections...");

    server.run().await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: ShutdownHandle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Interrupt received, shutting down");
            handle.shutdown();
        }
        Err(e) => warn!("Failed to listen for interrupt: {}", e),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lifespan_mcp=info,warn"));

    // stdout carries the protocol; logs go to stderr
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .json()
        .init();
}
