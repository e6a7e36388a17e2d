//! Arithmetic tools.

use crate::error::{Result, ToolError};
use crate::protocol::{CallToolResult, HandlerContext, Tool};
use crate::tools::registry::{ToolHandler, parse_arguments};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct AddArgs {
    pub a: i64,
    pub b: i64,
}

/// `add`: integer addition.
pub struct AddTool;

#[async_trait]
impl<C: Send + Sync + 'static> ToolHandler<C> for AddTool {
    fn definition(&self) -> Tool {
        crate::define_tool! {
            name: "add",
            description: "Add two numbers",
            schema: {
                "type": "object",
                "properties": {
                    "a": { "type": "integer" },
                    "b": { "type": "integer" }
                },
                "required": ["a", "b"]
            }
        }
    }

    async fn execute(&self, _ctx: &HandlerContext<C>, arguments: Value) -> Result<CallToolResult> {
        let args: AddArgs = parse_arguments(arguments)?;
        let sum = args
            .a
            .checked_add(args.b)
            .ok_or_else(|| ToolError::ExecutionFailed("integer overflow".into()))?;
        Ok(CallToolResult::text(sum.to_string()))
    }
}
