//! MCP prompt templates.

pub mod greeting;
pub mod registry;

pub use greeting::GreetUserPrompt;
pub use registry::{PromptHandler, PromptRegistry};

use crate::server::AppContext;

/// Create and register the application prompts.
pub fn create_registry() -> PromptRegistry<AppContext> {
    let registry = PromptRegistry::new();
    registry.register(GreetUserPrompt);
    registry
}
