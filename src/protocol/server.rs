//! MCP server with lifespan-bracketed lifecycle.

use crate::error::{McpError, ProtocolError, Result};
use crate::lifespan::{Lifecycle, LifecycleState, Lifespan, LifespanGuard};
use crate::protocol::handler::{Dispatcher, Handler};
use crate::protocol::session::ServerSession;
use crate::protocol::transport::{StdioTransport, Transport};
use crate::protocol::types::*;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// Requests the serving loop to stop from outside the server.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Stop reading new requests; in-flight requests finish and the finalizer runs.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// MCP Server.
///
/// [`run`](Self::run) brackets the serving loop with the lifespan hooks: startup before
/// the first message is read, shutdown after the last in-flight request has completed.
pub struct McpServer<H, L>
where
    H: Handler,
    L: Lifespan<Context = H::Context>,
{
    info: ServerInfo,
    handler: Arc<H>,
    lifespan: Arc<L>,
    lifecycle: Arc<Lifecycle>,
    session: Arc<ServerSession>,
    shutdown: ShutdownHandle,
}

impl<H, L> McpServer<H, L>
where
    H: Handler,
    L: Lifespan<Context = H::Context>,
{
    /// Create a new MCP server.
    pub fn new(handler: H, lifespan: L, info: ServerInfo) -> Self {
        Self {
            info,
            handler: Arc::new(handler),
            lifespan: Arc::new(lifespan),
            lifecycle: Arc::new(Lifecycle::new()),
            session: Arc::new(ServerSession::new()),
            shutdown: ShutdownHandle::new(),
        }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Get current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Lifecycle tracker, usable after `run` consumed the server.
    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.lifecycle)
    }

    pub fn session(&self) -> Arc<ServerSession> {
        Arc::clone(&self.session)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Check if server is running.
    pub fn is_running(&self) -> bool {
        self.lifecycle.state() == LifecycleState::Running
    }

    /// Run the server with stdio transport.
    #[instrument(skip(self), fields(server = %self.info.name))]
    pub async fn run(self) -> Result<()> {
        let transport = Arc::new(StdioTransport::stdio());
        self.run_with_transport(transport).await
    }

    /// Run the server with a custom transport.
    ///
    /// # Errors
    ///
    /// [`LifespanError::Startup`](crate::error::LifespanError::Startup) if the startup
    /// hook fails (nothing is served), a transport error that ended the serving loop, or
    /// [`LifespanError::Shutdown`](crate::error::LifespanError::Shutdown) if the finalizer
    /// failed.
    pub async fn run_with_transport<T: Transport + 'static>(self, transport: Arc<T>) -> Result<()> {
        info!(
            "Starting MCP server: {} v{}",
            self.info.name, self.info.version
        );

        let guard =
            LifespanGuard::acquire(Arc::clone(&self.lifespan), Arc::clone(&self.lifecycle)).await?;
        self.lifecycle.transition(LifecycleState::Running)?;
        info!("Server running");

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&self.handler),
            Arc::clone(&self.session),
            guard.context(),
        ));
        let served = self.serve(&dispatcher, &transport).await;
        drop(dispatcher);

        let released = guard.release().await;
        info!("Server stopped");

        served?;
        released.map_err(McpError::from)
    }

    /// Read and dispatch messages until shutdown, EOF or a transport fault, then wait for
    /// in-flight requests.
    async fn serve<T: Transport + 'static>(
        &self,
        dispatcher: &Arc<Dispatcher<H>>,
        transport: &Arc<T>,
    ) -> Result<()> {
        let mut in_flight = JoinSet::new();
        let mut shutdown_rx = self.shutdown.subscribe();

        let outcome = loop {
            while let Some(joined) = in_flight.try_join_next() {
                log_join(joined);
            }

            let read = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown_rx) => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
                read = transport.read_message() => read,
            };

            let message = match read {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    debug!("EOF received, shutting down");
                    break Ok(());
                }
                Err(McpError::Protocol(ProtocolError::ParseError)) => {
                    let response = JsonRpcResponse::error(None, JsonRpcError::parse_error());
                    if let Err(e) = transport.write_response(&response).await {
                        error!("Failed to send error response: {}", e);
                    }
                    continue;
                }
                Err(e) => {
                    error!("Transport error: {}", e);
                    break Err(e);
                }
            };

            match message {
                Message::Request(request) if request.method == "shutdown" => {
                    info!("Shutdown request received");
                    let is_notification = request.is_notification();
                    let response = dispatcher.dispatch(request).await;
                    if !is_notification && let Err(e) = transport.write_response(&response).await
                    {
                        error!("Failed to send response: {}", e);
                    }
                    break Ok(());
                }
                Message::Request(request) => {
                    in_flight.spawn(handle_request(
                        Arc::clone(dispatcher),
                        Arc::clone(transport),
                        request,
                    ));
                }
                Message::Invalid { id, reason } => {
                    warn!("Invalid request: {}", reason);
                    let err = ProtocolError::InvalidRequest(reason.into());
                    let response =
                        JsonRpcResponse::error(id, JsonRpcError::new(err.code(), err.to_string()));
                    if let Err(e) = transport.write_response(&response).await {
                        error!("Failed to send error response: {}", e);
                    }
                }
                Message::Response(response) => {
                    // We don't expect responses in server mode, but log them
                    warn!("Unexpected response received: {:?}", response.id);
                }
            }
        };

        if !in_flight.is_empty() {
            debug!("Waiting for {} in-flight requests", in_flight.len());
        }
        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }

        outcome
    }
}

/// Dispatch one request on its own task and write the response.
///
/// The handler runs in a nested task so a panic becomes an error response for this
/// request only.
async fn handle_request<H: Handler, T: Transport + 'static>(
    dispatcher: Arc<Dispatcher<H>>,
    transport: Arc<T>,
    request: JsonRpcRequest,
) {
    let id = request.id.clone();
    let is_notification = request.is_notification();

    let handler = tokio::spawn(async move { dispatcher.dispatch(request).await });
    let response = match handler.await {
        Ok(response) => response,
        Err(e) => {
            error!("Request handler aborted: {}", e);
            JsonRpcResponse::error(id, JsonRpcError::internal_error("Request handler panicked"))
        }
    };

    if !is_notification && let Err(e) = transport.write_response(&response).await {
        error!("Failed to send response: {}", e);
    }
}

/// Resolves once shutdown is requested; never resolves if the handle is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|requested| *requested).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn log_join(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!("Request task failed: {}", e);
    }
}

/// Builder for MCP Server.
pub struct McpServerBuilder<H, L> {
    handler: Option<H>,
    lifespan: Option<L>,
    name: String,
    version: String,
}

impl<H, L> McpServerBuilder<H, L>
where
    H: Handler,
    L: Lifespan<Context = H::Context>,
{
    pub fn new() -> Self {
        Self {
            handler: None,
            lifespan: None,
            name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }

    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn lifespan(mut self, lifespan: L) -> Self {
        self.lifespan = Some(lifespan);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn build(self) -> Result<McpServer<H, L>> {
        let handler = self.handler.ok_or_else(|| McpError::Internal {
            message: "Handler is required".into(),
        })?;
        let lifespan = self.lifespan.ok_or_else(|| McpError::Internal {
            message: "Lifespan is required".into(),
        })?;

        Ok(McpServer::new(
            handler,
            lifespan,
            ServerInfo {
                name: self.name,
                version: self.version,
            },
        ))
    }
}

impl<H, L> Default for McpServerBuilder<H, L>
where
    H: Handler,
    L: Lifespan<Context = H::Context>,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, ServerConfig};
    use crate::database::ConnectionMetricsSnapshot;
    use crate::error::{LifespanError, LifespanResult, ProtocolResult};
    use crate::protocol::handler::HandlerContext;
    use crate::protocol::transport::LineTransport;
    use crate::server::{AppContext, AppLifespan, McpHandler, app_state};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf};
    use tokio::task::JoinHandle;

    /// Records hook calls and every context pointer handed to a request.
    #[derive(Default)]
    struct Recorder {
        startups: AtomicUsize,
        shutdowns: AtomicUsize,
        handled: AtomicUsize,
        seen: Mutex<Vec<usize>>,
        events: Mutex<Vec<String>>,
    }

    struct Handle(u32);

    struct TestLifespan {
        recorder: Arc<Recorder>,
        fail_startup: bool,
        fail_shutdown: bool,
    }

    #[async_trait]
    impl Lifespan for TestLifespan {
        type Context = Handle;

        async fn startup(&self) -> LifespanResult<Handle> {
            self.recorder.startups.fetch_add(1, Ordering::SeqCst);
            self.recorder.events.lock().push("startup".into());
            if self.fail_startup {
                return Err(LifespanError::Startup("database unreachable".into()));
            }
            Ok(Handle(42))
        }

        async fn shutdown(&self, _context: &Handle) -> LifespanResult<()> {
            self.recorder.shutdowns.fetch_add(1, Ordering::SeqCst);
            self.recorder.events.lock().push("shutdown".into());
            if self.fail_shutdown {
                return Err(LifespanError::Shutdown("connection stuck".into()));
            }
            Ok(())
        }
    }

    struct TestHandler {
        recorder: Arc<Recorder>,
    }

    #[async_trait]
    impl Handler for TestHandler {
        type Context = Handle;

        async fn initialize(
            &self,
            _ctx: &HandlerContext<Handle>,
            _params: InitializeParams,
        ) -> ProtocolResult<InitializeResult> {
            Ok(InitializeResult {
                protocol_version: MCP_VERSION.into(),
                capabilities: ServerCapabilities::default(),
                server_info: ServerInfo {
                    name: "test".into(),
                    version: "1.0".into(),
                },
                instructions: None,
            })
        }

        async fn list_tools(
            &self,
            _ctx: &HandlerContext<Handle>,
        ) -> ProtocolResult<ListToolsResult> {
            Ok(ListToolsResult {
                tools: vec![],
                next_cursor: None,
            })
        }

        async fn call_tool(
            &self,
            ctx: &HandlerContext<Handle>,
            params: CallToolParams,
        ) -> ProtocolResult<CallToolResult> {
            self.recorder.handled.fetch_add(1, Ordering::SeqCst);
            self.recorder
                .seen
                .lock()
                .push(Arc::as_ptr(ctx.shared_context()) as usize);

            match params.name.as_str() {
                "query" => {
                    self.recorder.events.lock().push("query".into());
                    Ok(CallToolResult::text("Query result"))
                }
                "fail" => Ok(CallToolResult::error("handler fault")),
                "panic" => panic!("handler blew up"),
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(CallToolResult::text(format!("slow {}", ctx.lifespan_context().0)))
                }
                _ => Ok(CallToolResult::text(format!("fast {}", ctx.lifespan_context().0))),
            }
        }
    }

    fn server(
        recorder: &Arc<Recorder>,
        fail_startup: bool,
    ) -> McpServer<TestHandler, TestLifespan> {
        McpServerBuilder::new()
            .handler(TestHandler {
                recorder: Arc::clone(recorder),
            })
            .lifespan(TestLifespan {
                recorder: Arc::clone(recorder),
                fail_startup,
                fail_shutdown: false,
            })
            .name("test-server")
            .version("0.1.0")
            .build()
            .unwrap()
    }

    struct Client {
        writer: tokio::io::WriteHalf<DuplexStream>,
        lines: tokio::io::Lines<BufReader<ReadHalf<DuplexStream>>>,
        task: JoinHandle<Result<()>>,
    }

    impl Client {
        async fn send(&mut self, message: Value) {
            let mut line = message.to_string();
            line.push('\n');
            self.writer.write_all(line.as_bytes()).await.unwrap();
        }

        async fn recv(&mut self) -> Value {
            let line = self.lines.next_line().await.unwrap().unwrap();
            serde_json::from_str(&line).unwrap()
        }

        async fn close(&mut self) {
            self.writer.shutdown().await.unwrap();
        }

        async fn call(&mut self, id: i64, tool: &str) {
            self.send(json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "tools/call",
                "params": {"name": tool, "arguments": {}}
            }))
            .await;
        }
    }

    fn start<H, L>(server: McpServer<H, L>) -> Client
    where
        H: Handler,
        L: Lifespan<Context = H::Context>,
    {
        let (client, server_side) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (client_read, client_write) = tokio::io::split(client);

        let transport = Arc::new(LineTransport::new(BufReader::new(server_read), server_write));
        let task = tokio::spawn(server.run_with_transport(transport));

        Client {
            writer: client_write,
            lines: BufReader::new(client_read).lines(),
            task,
        }
    }

    fn text_of(response: &Value) -> &str {
        response["result"]["content"][0]["text"].as_str().unwrap()
    }

    #[test]
    fn test_server_builder() {
        let recorder = Arc::new(Recorder::default());
        let server = server(&recorder, false);

        assert_eq!(server.info().name, "test-server");
        assert_eq!(server.info().version, "0.1.0");
        assert_eq!(server.state(), LifecycleState::NotStarted);
        assert!(!server.is_running());
    }

    #[test]
    fn test_builder_requires_lifespan() {
        let recorder = Arc::new(Recorder::default());
        let result = McpServerBuilder::<TestHandler, TestLifespan>::new()
            .handler(TestHandler { recorder })
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_query_scenario_trace() {
        let recorder = Arc::new(Recorder::default());
        let server = server(&recorder, false);
        let lifecycle = server.lifecycle();
        let mut client = start(server);

        client.call(1, "query").await;
        let response = client.recv().await;
        assert_eq!(response["id"], 1);
        assert_eq!(text_of(&response), "Query result");

        client
            .send(json!({"jsonrpc": "2.0", "id": 2, "method": "shutdown"}))
            .await;
        let response = client.recv().await;
        assert_eq!(response["id"], 2);

        client.task.await.unwrap().unwrap();

        assert_eq!(
            lifecycle.history(),
            vec![
                LifecycleState::NotStarted,
                LifecycleState::Initializing,
                LifecycleState::Running,
                LifecycleState::ShuttingDown,
                LifecycleState::Stopped,
            ]
        );
        assert_eq!(recorder.startups.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(
            *recorder.events.lock(),
            vec!["startup".to_string(), "query".into(), "shutdown".into()]
        );
    }

    #[tokio::test]
    async fn test_every_request_sees_same_context() {
        let recorder = Arc::new(Recorder::default());
        let mut client = start(server(&recorder, false));

        for id in 1..=5 {
            client.call(id, "fast").await;
        }
        for _ in 1..=5 {
            let response = client.recv().await;
            assert_eq!(text_of(&response), "fast 42");
        }

        client.close().await;
        client.task.await.unwrap().unwrap();

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|ptr| *ptr == seen[0]));
    }

    #[tokio::test]
    async fn test_startup_failure_never_serves() {
        let recorder = Arc::new(Recorder::default());
        let server = server(&recorder, true);
        let lifecycle = server.lifecycle();
        let mut client = start(server);

        // The server may already be gone, so the write itself can fail.
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "query"}
        });
        let _ = client
            .writer
            .write_all(format!("{}\n", request).as_bytes())
            .await;
        let result = client.task.await.unwrap();

        assert!(matches!(
            result,
            Err(McpError::Lifespan(LifespanError::Startup(_)))
        ));
        assert!(!lifecycle.history().contains(&LifecycleState::Running));
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert_eq!(recorder.handled.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_fault_is_isolated() {
        let recorder = Arc::new(Recorder::default());
        let mut client = start(server(&recorder, false));

        client.call(1, "fast").await;
        assert_eq!(text_of(&client.recv().await), "fast 42");

        client.call(2, "panic").await;
        let faulted = client.recv().await;
        assert_eq!(faulted["id"], 2);
        assert_eq!(faulted["error"]["code"], -32603);

        client.call(3, "fail").await;
        let failed = client.recv().await;
        assert_eq!(failed["result"]["isError"], true);

        client.call(4, "fast").await;
        assert_eq!(text_of(&client.recv().await), "fast 42");

        client.close().await;
        client.task.await.unwrap().unwrap();
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_requests_complete_out_of_order() {
        let recorder = Arc::new(Recorder::default());
        let mut client = start(server(&recorder, false));

        client.call(1, "slow").await;
        client.call(2, "fast").await;

        let first = client.recv().await;
        let second = client.recv().await;
        assert_eq!(first["id"], 2);
        assert_eq!(second["id"], 1);
        assert_eq!(text_of(&second), "slow 42");

        client.close().await;
        client.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_handle_drains_in_flight_before_finalizing() {
        let recorder = Arc::new(Recorder::default());
        let server = server(&recorder, false);
        let handle = server.shutdown_handle();
        let lifecycle = server.lifecycle();
        let mut running = lifecycle.subscribe();
        let mut client = start(server);

        running
            .wait_for(|state| *state == LifecycleState::Running)
            .await
            .unwrap();
        client.call(1, "slow").await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.shutdown();

        let response = client.recv().await;
        assert_eq!(text_of(&response), "slow 42");
        client.task.await.unwrap().unwrap();

        assert!(handle.is_shutdown_requested());
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_parse_error_keeps_serving() {
        let recorder = Arc::new(Recorder::default());
        let mut client = start(server(&recorder, false));

        client.writer.write_all(b"{broken\n").await.unwrap();
        let response = client.recv().await;
        assert_eq!(response["error"]["code"], -32700);

        client.call(1, "fast").await;
        assert_eq!(text_of(&client.recv().await), "fast 42");

        client.close().await;
        client.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_invalid_utf8_keeps_serving() {
        let recorder = Arc::new(Recorder::default());
        let server = server(&recorder, false);
        let lifecycle = server.lifecycle();
        let mut client = start(server);

        client
            .writer
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\xff\"}\n")
            .await
            .unwrap();
        let response = client.recv().await;
        assert_eq!(response["error"]["code"], -32700);

        client.call(2, "fast").await;
        let response = client.recv().await;
        assert_eq!(response["id"], 2);
        assert_eq!(text_of(&response), "fast 42");
        assert_eq!(lifecycle.state(), LifecycleState::Running);

        client.close().await;
        client.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_malformed_request_is_answered_with_invalid_request() {
        let recorder = Arc::new(Recorder::default());
        let mut client = start(server(&recorder, false));

        client
            .send(json!({"jsonrpc": "2.0", "id": 7, "method": 42}))
            .await;
        let response = client.recv().await;
        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], -32600);

        client.send(json!({"jsonrpc": "2.0", "id": 8})).await;
        let response = client.recv().await;
        assert_eq!(response["id"], 8);
        assert_eq!(response["error"]["code"], -32600);

        client.call(9, "fast").await;
        assert_eq!(text_of(&client.recv().await), "fast 42");

        client.close().await;
        client.task.await.unwrap().unwrap();
        assert_eq!(recorder.handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_fault_is_reported_and_still_stops() {
        let recorder = Arc::new(Recorder::default());
        let server = McpServerBuilder::new()
            .handler(TestHandler {
                recorder: Arc::clone(&recorder),
            })
            .lifespan(TestLifespan {
                recorder: Arc::clone(&recorder),
                fail_startup: false,
                fail_shutdown: true,
            })
            .build()
            .unwrap();
        let lifecycle = server.lifecycle();
        let mut client = start(server);

        client.call(1, "fast").await;
        assert_eq!(text_of(&client.recv().await), "fast 42");
        client.close().await;

        let result = client.task.await.unwrap();
        assert!(matches!(
            result,
            Err(McpError::Lifespan(LifespanError::Shutdown(_)))
        ));
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert_eq!(
            lifecycle.history(),
            vec![
                LifecycleState::NotStarted,
                LifecycleState::Initializing,
                LifecycleState::Running,
                LifecycleState::ShuttingDown,
                LifecycleState::Stopped,
            ]
        );
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 1);
    }

    /// Wraps the application lifespan and records the handle's state once it is closed.
    struct ObservedApp {
        inner: AppLifespan,
        closed: Arc<Mutex<Option<(bool, ConnectionMetricsSnapshot)>>>,
    }

    #[async_trait]
    impl Lifespan for ObservedApp {
        type Context = AppContext;

        async fn startup(&self) -> LifespanResult<AppContext> {
            self.inner.startup().await
        }

        async fn shutdown(&self, context: &AppContext) -> LifespanResult<()> {
            let result = self.inner.shutdown(context).await;
            *self.closed.lock() = Some((context.db.is_connected(), context.db.metrics()));
            result
        }
    }

    #[tokio::test]
    async fn test_application_query_reads_shared_database() {
        let closed = Arc::new(Mutex::new(None));
        let state = app_state(ServerConfig::default()).unwrap();
        let server = McpServerBuilder::new()
            .handler(McpHandler::new(Arc::new(state)))
            .lifespan(ObservedApp {
                inner: AppLifespan::new(DatabaseConfig::default()),
                closed: Arc::clone(&closed),
            })
            .build()
            .unwrap();
        let lifecycle = server.lifecycle();
        let mut client = start(server);

        client.call(1, "query_db").await;
        let response = client.recv().await;
        assert_eq!(response["id"], 1);
        assert_eq!(text_of(&response), "Query result");

        client
            .send(json!({"jsonrpc": "2.0", "id": 2, "method": "shutdown"}))
            .await;
        assert_eq!(client.recv().await["id"], 2);
        client.task.await.unwrap().unwrap();

        assert_eq!(
            lifecycle.history(),
            vec![
                LifecycleState::NotStarted,
                LifecycleState::Initializing,
                LifecycleState::Running,
                LifecycleState::ShuttingDown,
                LifecycleState::Stopped,
            ]
        );
        let (connected, metrics) = closed.lock().take().unwrap();
        assert!(!connected);
        assert_eq!(metrics.connects, 1);
        assert_eq!(metrics.queries_executed, 1);
        assert_eq!(metrics.disconnects, 1);
    }
}
