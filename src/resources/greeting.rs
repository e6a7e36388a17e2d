//! Greeting resource.

use crate::error::{Result, ToolError};
use crate::protocol::HandlerContext;
use crate::resources::registry::ResourceHandler;
use async_trait::async_trait;
use std::collections::HashMap;

/// `greeting://{name}`: a personalized greeting.
pub struct GreetingResource;

#[async_trait]
impl<C: Send + Sync + 'static> ResourceHandler<C> for GreetingResource {
    fn uri_template(&self) -> &str {
        "greeting://{name}"
    }

    fn name(&self) -> &str {
        "greeting"
    }

    fn description(&self) -> Option<&str> {
        Some("Get a personalized greeting")
    }

    async fn read(
        &self,
        _ctx: &HandlerContext<C>,
        params: HashMap<String, String>,
    ) -> Result<String> {
        let name = params
            .get("name")
            .ok_or_else(|| ToolError::InvalidArguments("missing name".into()))?;
        Ok(format!("Hello, {}!", name))
    }
}
