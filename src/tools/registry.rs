//! Tool registry for dynamic tool registration.

use crate::error::{Result, ToolError};
use crate::protocol::{CallToolParams, CallToolResult, HandlerContext, Tool};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// A named tool. `C` is the lifespan context the tool reads from.
#[async_trait]
pub trait ToolHandler<C>: Send + Sync {
    fn definition(&self) -> Tool;
    async fn execute(&self, ctx: &HandlerContext<C>, arguments: Value) -> Result<CallToolResult>;
}

pub struct ToolRegistry<C> {
    tools: DashMap<String, Arc<dyn ToolHandler<C>>>,
}

impl<C: Send + Sync + 'static> ToolRegistry<C> {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    pub fn register<T: ToolHandler<C> + 'static>(&self, tool: T) {
        let definition = tool.definition();
        let name = definition.name.clone();
        debug!("Registering tool: {}", name);
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler<C>>> {
        self.tools.get(name).map(|r| Arc::clone(&*r))
    }

    /// Tool definitions sorted by name.
    pub fn list(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self.tools.iter().map(|r| r.value().definition()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub async fn execute(
        &self,
        ctx: &HandlerContext<C>,
        params: CallToolParams,
    ) -> Result<CallToolResult> {
        let tool = self
            .get(&params.name)
            .ok_or_else(|| ToolError::NotFound(params.name.clone()))?;

        tool.execute(ctx, params.arguments).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl<C: Send + Sync + 'static> Default for ToolRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize tool arguments, treating a missing object as `{}`.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(e.to_string()).into())
}

#[macro_export]
macro_rules! define_tool {
    (
        name: $name:expr,
        description: $desc:expr,
        schema: $schema:tt
    ) => {
        $crate::protocol::Tool {
            name: $name.into(),
            description: Some($desc.into()),
            input_schema: serde_json::json!($schema),
        }
    };
}
