//! MCP request handler implementation.

use crate::error::{McpError, ProtocolError, ProtocolResult, ToolError};
use crate::protocol::{
    CallToolParams, CallToolResult, GetPromptParams, GetPromptResult, Handler, HandlerContext,
    InitializeParams, InitializeResult, ListPromptsResult, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, MCP_VERSION, PromptsCapability, ReadResourceParams,
    ReadResourceResult, ResourcesCapability, ServerCapabilities, ServerInfo, ToolsCapability,
};
use crate::server::state::ServerState;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

/// MCP request handler that routes protocol methods to the registries in [`ServerState`].
pub struct McpHandler<C> {
    state: Arc<ServerState<C>>,
}

impl<C: Send + Sync + 'static> McpHandler<C> {
    pub fn new(state: Arc<ServerState<C>>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<ServerState<C>> {
        &self.state
    }

    fn capabilities(&self) -> ServerCapabilities {
        let state = &self.state;
        ServerCapabilities {
            tools: (!state.tools.is_empty()).then(|| ToolsCapability {
                list_changed: Some(false),
            }),
            resources: (!state.resources.is_empty()).then(|| ResourcesCapability {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            prompts: (!state.prompts.is_empty()).then(|| PromptsCapability {
                list_changed: Some(false),
            }),
        }
    }
}

/// Registry errors that are the caller's fault keep their JSON-RPC code; the rest are internal.
fn protocol_error(err: McpError) -> ProtocolError {
    match err {
        McpError::Protocol(e) => e,
        McpError::Tool(ToolError::InvalidArguments(msg)) => {
            ProtocolError::InvalidParams(msg.into())
        }
        other => ProtocolError::InternalError(other.to_string().into()),
    }
}

#[async_trait]
impl<C: Send + Sync + 'static> Handler for McpHandler<C> {
    type Context = C;

    async fn initialize(
        &self,
        ctx: &HandlerContext<C>,
        params: InitializeParams,
    ) -> ProtocolResult<InitializeResult> {
        info!(
            "Initialize request from {} v{}",
            params.client_info.name, params.client_info.version
        );
        debug!("Client capabilities: {:?}", params.capabilities);

        ctx.session()
            .set_client(params.client_info, params.protocol_version);

        Ok(InitializeResult {
            protocol_version: MCP_VERSION.into(),
            capabilities: self.capabilities(),
            server_info: ServerInfo {
                name: self.state.config.name.to_string(),
                version: self.state.config.version.to_string(),
            },
            instructions: self.state.config.instructions.clone(),
        })
    }

    async fn initialized(&self, ctx: &HandlerContext<C>) -> ProtocolResult<()> {
        ctx.session().set_initialized();
        info!("Server initialized successfully");
        Ok(())
    }

    async fn shutdown(&self, _ctx: &HandlerContext<C>) -> ProtocolResult<()> {
        info!("Shutdown request received");
        Ok(())
    }

    async fn list_tools(&self, _ctx: &HandlerContext<C>) -> ProtocolResult<ListToolsResult> {
        let tools = self.state.tools.list();
        debug!("Listing {} tools", tools.len());

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        ctx: &HandlerContext<C>,
        params: CallToolParams,
    ) -> ProtocolResult<CallToolResult> {
        debug!("Tool call: {}", params.name);

        match self.state.tools.execute(ctx, params).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Tool execution error: {}", e);
                Ok(CallToolResult::error(e.to_string()))
            }
        }
    }

    async fn list_resources(
        &self,
        _ctx: &HandlerContext<C>,
    ) -> ProtocolResult<ListResourcesResult> {
        Ok(ListResourcesResult {
            resources: self.state.resources.list(),
            next_cursor: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _ctx: &HandlerContext<C>,
    ) -> ProtocolResult<ListResourceTemplatesResult> {
        Ok(ListResourceTemplatesResult {
            resource_templates: self.state.resources.list_templates(),
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ctx: &HandlerContext<C>,
        params: ReadResourceParams,
    ) -> ProtocolResult<ReadResourceResult> {
        debug!("Resource read: {}", params.uri);
        self.state
            .resources
            .read(ctx, &params.uri)
            .await
            .map_err(protocol_error)
    }

    async fn list_prompts(&self, _ctx: &HandlerContext<C>) -> ProtocolResult<ListPromptsResult> {
        Ok(ListPromptsResult {
            prompts: self.state.prompts.list(),
            next_cursor: None,
        })
    }

    async fn get_prompt(
        &self,
        ctx: &HandlerContext<C>,
        params: GetPromptParams,
    ) -> ProtocolResult<GetPromptResult> {
        debug!("Prompt get: {}", params.name);
        self.state
            .prompts
            .get(ctx, &params.name, params.arguments)
            .await
            .map_err(protocol_error)
    }
}
