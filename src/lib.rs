//! MCP server with lifespan-scoped shared resources.
//!
//! A [`Lifespan`](lifespan::Lifespan) opens long-lived resources once before the first
//! request is served and closes them once after the last one completes. Every tool,
//! resource and prompt handler reads the same context through its request context.
//!
//! # Example
//!
//! ```no_run
//! use lifespan_mcp::{
//!     config::ServerConfig,
//!     protocol::McpServerBuilder,
//!     server::{AppLifespan, McpHandler, app_state},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::builder().from_env().build()?;
//!     let lifespan = AppLifespan::new(config.database.clone());
//!     let handler = McpHandler::new(Arc::new(app_state(config)?));
//!
//!     // The database is connected before the first request and closed after the last.
//!     McpServerBuilder::new()
//!         .handler(handler)
//!         .lifespan(lifespan)
//!         .build()?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod lifespan;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use config::{DatabaseConfig, DatabaseConfigBuilder, ServerConfig};
pub use context::RequestContext;
pub use database::Database;
pub use error::{McpError, Result};
pub use lifespan::{Lifecycle, LifecycleState, Lifespan};
pub use protocol::{McpServer, McpServerBuilder, ShutdownHandle};
pub use server::{AppContext, AppLifespan, McpHandler, ServerState, ServerStateBuilder};
