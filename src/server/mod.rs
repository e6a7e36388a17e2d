//! MCP server implementation.

pub mod app;
pub mod handler;
pub mod state;

pub use app::{AppContext, AppLifespan, app_state};
pub use handler::McpHandler;
pub use state::{ServerState, ServerStateBuilder};
