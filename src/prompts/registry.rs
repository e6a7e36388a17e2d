//! Prompt registry.

use crate::error::{ProtocolError, Result};
use crate::protocol::{GetPromptResult, HandlerContext, Prompt};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait PromptHandler<C>: Send + Sync {
    fn definition(&self) -> Prompt;
    async fn render(
        &self,
        ctx: &HandlerContext<C>,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult>;
}

pub struct PromptRegistry<C> {
    prompts: DashMap<String, Arc<dyn PromptHandler<C>>>,
}

impl<C: Send + Sync + 'static> PromptRegistry<C> {
    pub fn new() -> Self {
        Self {
            prompts: DashMap::new(),
        }
    }

    pub fn register<P: PromptHandler<C> + 'static>(&self, prompt: P) {
        let name = prompt.definition().name;
        debug!("Registering prompt: {}", name);
        self.prompts.insert(name, Arc::new(prompt));
    }

    pub fn list(&self) -> Vec<Prompt> {
        let mut prompts: Vec<Prompt> = self
            .prompts
            .iter()
            .map(|r| r.value().definition())
            .collect();
        prompts.sort_by(|a, b| a.name.cmp(&b.name));
        prompts
    }

    /// Render a prompt after checking its required arguments are present.
    pub async fn get(
        &self,
        ctx: &HandlerContext<C>,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult> {
        let prompt = self
            .prompts
            .get(name)
            .map(|r| Arc::clone(&*r))
            .ok_or_else(|| ProtocolError::PromptNotFound(name.to_string()))?;

        let definition = prompt.definition();
        for argument in definition.arguments.iter().flatten() {
            if argument.required.unwrap_or(false) && !arguments.contains_key(&argument.name) {
                return Err(ProtocolError::InvalidParams(
                    format!("Missing required argument: {}", argument.name).into(),
                )
                .into());
            }
        }

        prompt.render(ctx, arguments).await
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl<C: Send + Sync + 'static> Default for PromptRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
