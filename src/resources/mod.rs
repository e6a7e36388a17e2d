//! MCP resources addressed by URI or URI template.

pub mod greeting;
pub mod registry;
pub mod template;

pub use greeting::GreetingResource;
pub use registry::{ResourceHandler, ResourceRegistry};
pub use template::UriTemplate;

use crate::error::Result;
use crate::server::AppContext;

/// Create and register the application resources.
pub fn create_registry() -> Result<ResourceRegistry<AppContext>> {
    let registry = ResourceRegistry::new();
    registry.register(GreetingResource)?;
    Ok(registry)
}
