//! MCP tool definitions and registry.

pub mod math;
pub mod query;
pub mod registry;

pub use math::AddTool;
pub use query::QueryDbTool;
pub use registry::{ToolHandler, ToolRegistry, parse_arguments};

use crate::server::AppContext;

/// Create and register the application tools.
pub fn create_registry() -> ToolRegistry<AppContext> {
    let registry = ToolRegistry::new();

    registry.register(QueryDbTool);
    registry.register(AddTool);

    registry
}
