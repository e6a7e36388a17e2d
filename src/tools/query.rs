//! Database query tool backed by the lifespan context.

use crate::error::{McpError, Result};
use crate::protocol::{CallToolResult, HandlerContext, Tool};
use crate::server::AppContext;
use crate::tools::registry::ToolHandler;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

/// `query_db`: runs a query on the connection opened at startup.
pub struct QueryDbTool;

#[async_trait]
impl ToolHandler<AppContext> for QueryDbTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "query_db".into(),
            description: Some("Query the database using the lifespan context.".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    #[instrument(skip(self, ctx, _arguments), fields(tool = "query_db"))]
    async fn execute(
        &self,
        ctx: &HandlerContext<AppContext>,
        _arguments: Value,
    ) -> Result<CallToolResult> {
        let db = &ctx.lifespan_context().db;
        debug!("Querying {}", db.name());

        let result = db.query().await.map_err(McpError::from)?;
        Ok(CallToolResult::text(result))
    }
}
