//! Server state management.

use crate::config::ServerConfig;
use crate::error::{ConfigError, Result};
use crate::prompts::PromptRegistry;
use crate::resources::ResourceRegistry;
use crate::tools::ToolRegistry;

/// Registries and configuration, fixed for the lifetime of the process.
///
/// Per-run resources live in the lifespan context `C`, not here.
pub struct ServerState<C> {
    pub config: ServerConfig,
    pub tools: ToolRegistry<C>,
    pub resources: ResourceRegistry<C>,
    pub prompts: PromptRegistry<C>,
}

impl<C: Send + Sync + 'static> ServerState<C> {
    pub fn new(
        config: ServerConfig,
        tools: ToolRegistry<C>,
        resources: ResourceRegistry<C>,
        prompts: PromptRegistry<C>,
    ) -> Self {
        Self {
            config,
            tools,
            resources,
            prompts,
        }
    }
}

pub struct ServerStateBuilder<C> {
    config: Option<ServerConfig>,
    tools: Option<ToolRegistry<C>>,
    resources: Option<ResourceRegistry<C>>,
    prompts: Option<PromptRegistry<C>>,
}

impl<C: Send + Sync + 'static> ServerStateBuilder<C> {
    pub fn new() -> Self {
        Self {
            config: None,
            tools: None,
            resources: None,
            prompts: None,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry<C>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn resources(mut self, resources: ResourceRegistry<C>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn prompts(mut self, prompts: PromptRegistry<C>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Missing registries default to empty ones.
    pub fn build(self) -> Result<ServerState<C>> {
        let config = self
            .config
            .ok_or(ConfigError::MissingField("server config".into()))?;

        Ok(ServerState::new(
            config,
            self.tools.unwrap_or_default(),
            self.resources.unwrap_or_default(),
            self.prompts.unwrap_or_default(),
        ))
    }
}

impl<C: Send + Sync + 'static> Default for ServerStateBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
