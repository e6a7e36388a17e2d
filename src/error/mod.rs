//! Error types for the MCP server.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` conversions.

use crate::lifespan::LifecycleState;
use std::borrow::Cow;
use thiserror::Error;

/// Main error type for the lifespan MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Lifespan error: {0}")]
    Lifespan(#[from] LifespanError),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: Cow<'static, str> },
}

/// JSON-RPC 2.0 and MCP protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Parse error: invalid JSON")]
    ParseError,

    #[error("Invalid request: {0}")]
    InvalidRequest(Cow<'static, str>),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(Cow<'static, str>),

    #[error("Internal error: {0}")]
    InternalError(Cow<'static, str>),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),
}

impl ProtocolError {
    /// Returns the JSON-RPC 2.0 error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) | Self::PromptNotFound(_) => -32602,
            Self::InternalError(_) => -32603,
            Self::ResourceNotFound(_) => -32002,
        }
    }
}

/// Errors raised by the shared database resource.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection is closed")]
    NotConnected,

    #[error("Connection timed out after {0}ms")]
    Timeout(u64),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Disconnect failed: {0}")]
    DisconnectFailed(String),
}

/// Faults around the startup/shutdown bracket of a server run.
#[derive(Debug, Error)]
pub enum LifespanError {
    /// The resource initializer failed; the server never started serving.
    #[error("Startup failed: {0}")]
    Startup(Cow<'static, str>),

    /// The resource finalizer failed to release a resource cleanly.
    #[error("Shutdown failed: {0}")]
    Shutdown(Cow<'static, str>),

    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}

impl From<DatabaseError> for LifespanError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::DisconnectFailed(msg) => Self::Shutdown(msg.into()),
            other => Self::Startup(other.to_string().into()),
        }
    }
}

/// Usage faults of the per-request context accessor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("Context is not available outside of a request")]
    OutsideRequest,

    #[error("Lifespan context is not of type {expected}")]
    TypeMismatch { expected: &'static str },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(Cow<'static, str>),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: Cow<'static, str>,
        message: Cow<'static, str>,
    },
}

/// Tool execution errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Result type alias for McpError.
pub type Result<T> = std::result::Result<T, McpError>;

/// Result type alias for DatabaseError.
pub type DbResult<T> = std::result::Result<T, DatabaseError>;

/// Result type alias for ProtocolError.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Result type alias for LifespanError.
pub type LifespanResult<T> = std::result::Result<T, LifespanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_codes() {
        assert_eq!(ProtocolError::ParseError.code(), -32700);
        assert_eq!(ProtocolError::InvalidRequest("test".into()).code(), -32600);
        assert_eq!(ProtocolError::MethodNotFound("test".into()).code(), -32601);
        assert_eq!(ProtocolError::InvalidParams("test".into()).code(), -32602);
        assert_eq!(ProtocolError::InternalError("test".into()).code(), -32603);
        assert_eq!(ProtocolError::ResourceNotFound("x".into()).code(), -32002);
    }

    #[test]
    fn test_error_conversion() {
        let db_error = DatabaseError::NotConnected;
        let mcp_error: McpError = db_error.into();
        assert!(matches!(mcp_error, McpError::Database(_)));
    }

    #[test]
    fn test_database_error_maps_to_lifespan_fault() {
        let startup: LifespanError = DatabaseError::Timeout(50).into();
        assert!(matches!(startup, LifespanError::Startup(_)));

        let shutdown: LifespanError = DatabaseError::DisconnectFailed("busy".into()).into();
        assert!(matches!(shutdown, LifespanError::Shutdown(_)));
    }
}
