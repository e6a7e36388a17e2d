//! MCP protocol implementation over JSON-RPC 2.0.

pub mod handler;
pub mod server;
pub mod session;
pub mod transport;
pub mod types;

pub use handler::{Dispatcher, Handler, HandlerContext};
pub use server::{McpServer, McpServerBuilder, ShutdownHandle};
pub use session::ServerSession;
pub use transport::{LineTransport, StdioTransport, Transport};
pub use types::*;
