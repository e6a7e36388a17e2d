//! Request handler and method dispatcher.

use crate::context::RequestContext;
use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::session::ServerSession;
use crate::protocol::types::*;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Context passed to every [`Handler`] method.
pub type HandlerContext<C> = RequestContext<ServerSession, C>;

/// Handler trait for processing MCP requests.
///
/// `Context` is the lifespan context shared by all requests of a server run.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    type Context: Send + Sync + 'static;

    /// Handle initialize request.
    async fn initialize(
        &self,
        ctx: &HandlerContext<Self::Context>,
        params: InitializeParams,
    ) -> ProtocolResult<InitializeResult>;

    /// Handle initialized notification.
    async fn initialized(&self, ctx: &HandlerContext<Self::Context>) -> ProtocolResult<()> {
        ctx.session().set_initialized();
        Ok(())
    }

    /// Handle shutdown request.
    async fn shutdown(&self, _ctx: &HandlerContext<Self::Context>) -> ProtocolResult<()> {
        Ok(())
    }

    /// List available tools.
    async fn list_tools(&self, ctx: &HandlerContext<Self::Context>)
    -> ProtocolResult<ListToolsResult>;

    /// Call a tool.
    async fn call_tool(
        &self,
        ctx: &HandlerContext<Self::Context>,
        params: CallToolParams,
    ) -> ProtocolResult<CallToolResult>;

    async fn list_resources(
        &self,
        _ctx: &HandlerContext<Self::Context>,
    ) -> ProtocolResult<ListResourcesResult> {
        Ok(ListResourcesResult {
            resources: vec![],
            next_cursor: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _ctx: &HandlerContext<Self::Context>,
    ) -> ProtocolResult<ListResourceTemplatesResult> {
        Ok(ListResourceTemplatesResult {
            resource_templates: vec![],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        _ctx: &HandlerContext<Self::Context>,
        params: ReadResourceParams,
    ) -> ProtocolResult<ReadResourceResult> {
        Err(ProtocolError::ResourceNotFound(params.uri))
    }

    async fn list_prompts(
        &self,
        _ctx: &HandlerContext<Self::Context>,
    ) -> ProtocolResult<ListPromptsResult> {
        Ok(ListPromptsResult {
            prompts: vec![],
            next_cursor: None,
        })
    }

    async fn get_prompt(
        &self,
        _ctx: &HandlerContext<Self::Context>,
        params: GetPromptParams,
    ) -> ProtocolResult<GetPromptResult> {
        Err(ProtocolError::PromptNotFound(params.name))
    }

    /// Handle ping request.
    async fn ping(&self, _ctx: &HandlerContext<Self::Context>) -> ProtocolResult<Value> {
        Ok(serde_json::json!({}))
    }
}

/// Method dispatcher that routes requests to appropriate handlers.
///
/// Holds the session and the lifespan context of the current run; every dispatched
/// request sees the same two allocations.
pub struct Dispatcher<H: Handler> {
    handler: Arc<H>,
    session: Arc<ServerSession>,
    context: Arc<H::Context>,
}

impl<H: Handler> Dispatcher<H> {
    pub fn new(handler: Arc<H>, session: Arc<ServerSession>, context: Arc<H::Context>) -> Self {
        Self {
            handler,
            session,
            context,
        }
    }

    pub fn session(&self) -> &Arc<ServerSession> {
        &self.session
    }

    /// Dispatch a request to the appropriate handler method.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let seq = self.session.next_request_id();
        debug!("Dispatching request #{}: {}", seq, request.method);

        let ctx = RequestContext::new(
            &request,
            Arc::clone(&self.session),
            Arc::clone(&self.context),
        );
        let id = request.id.clone();
        let result = ctx.scope(self.route(&ctx, request)).await;

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                error!("Request failed: {}", e);
                JsonRpcResponse::error(id, JsonRpcError::new(e.code(), e.to_string()))
            }
        }
    }

    async fn route(
        &self,
        ctx: &HandlerContext<H::Context>,
        request: JsonRpcRequest,
    ) -> ProtocolResult<Value> {
        let handler = &self.handler;
        match request.method.as_str() {
            "initialize" => to_value(handler.initialize(ctx, params(request.params)?).await?),
            "notifications/initialized" | "initialized" => {
                handler.initialized(ctx).await?;
                Ok(Value::Null)
            }
            "shutdown" => {
                handler.shutdown(ctx).await?;
                Ok(Value::Null)
            }
            "ping" => handler.ping(ctx).await,
            "tools/list" => to_value(handler.list_tools(ctx).await?),
            "tools/call" => to_value(handler.call_tool(ctx, params(request.params)?).await?),
            "resources/list" => to_value(handler.list_resources(ctx).await?),
            "resources/templates/list" => to_value(handler.list_resource_templates(ctx).await?),
            "resources/read" => {
                to_value(handler.read_resource(ctx, params(request.params)?).await?)
            }
            "prompts/list" => to_value(handler.list_prompts(ctx).await?),
            "prompts/get" => to_value(handler.get_prompt(ctx, params(request.params)?).await?),
            method => {
                warn!("Unknown method: {}", method);
                Err(ProtocolError::MethodNotFound(method.to_string()))
            }
        }
    }
}

fn params<T: DeserializeOwned>(params: Option<Value>) -> ProtocolResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| ProtocolError::InvalidParams(e.to_string().into()))?
        .ok_or_else(|| ProtocolError::InvalidParams("Missing params".into()))
}

fn to_value<T: Serialize>(result: T) -> ProtocolResult<Value> {
    serde_json::to_value(result).map_err(|e| ProtocolError::InternalError(e.to_string().into()))
}
