//! Newline-delimited JSON-RPC transport.

use crate::error::{McpError, ProtocolError, Result};
use crate::protocol::types::{JsonRpcRequest, JsonRpcResponse, Message, RequestId};
use serde_json::Value;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};
use tokio::sync::Mutex;
use tracing::{debug, error, trace};

/// Transport trait for MCP communication.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Next message, or `None` at end of stream.
    ///
    /// A line that is not UTF-8 or not JSON yields [`ProtocolError::ParseError`]; the
    /// stream stays usable.
    async fn read_message(&self) -> Result<Option<Message>>;
    async fn write_response(&self, response: &JsonRpcResponse) -> Result<()>;
}

/// One JSON message per line over any async reader/writer pair.
pub struct LineTransport<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
}

/// Stdio-based transport for MCP.
pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::stdio()
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }

    /// Read the next non-blank line.
    ///
    /// The whole line is consumed before it is decoded, so invalid UTF-8 only costs
    /// that line.
    async fn read_line(&self) -> Result<Option<String>> {
        let mut reader = self.reader.lock().await;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => return Ok(None), // EOF
                Ok(_) => {
                    let line = String::from_utf8(std::mem::take(&mut buf)).map_err(|e| {
                        error!("Received line is not valid UTF-8: {}", e);
                        McpError::Protocol(ProtocolError::ParseError)
                    })?;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    trace!("Received line: {}", trimmed);
                    return Ok(Some(trimmed.to_string()));
                }
                Err(e) => {
                    error!("Error reading from transport: {}", e);
                    return Err(McpError::Io(e));
                }
            }
        }
    }

    async fn write_line(&self, content: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        trace!("Sending line: {}", content);
        writer.write_all(content.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_message(&self) -> Result<Option<Message>> {
        let Some(line) = self.read_line().await? else {
            return Ok(None);
        };

        let value: Value = serde_json::from_str(&line).map_err(|e| {
            error!("Failed to parse message: {}", e);
            McpError::Protocol(ProtocolError::ParseError)
        })?;

        Ok(Some(classify(value)))
    }

    async fn write_response(&self, response: &JsonRpcResponse) -> Result<()> {
        let json = serde_json::to_string(response)?;
        debug!("Sending response: id={:?}", response.id);
        self.write_line(&json).await
    }
}

/// Sort a JSON value into request, response or invalid by the members it carries.
fn classify(value: Value) -> Message {
    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    let Some(object) = value.as_object() else {
        return Message::Invalid {
            id,
            reason: "message is not a JSON object".into(),
        };
    };

    if object.contains_key("method") {
        return match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => {
                debug!("Received request: method={}", request.method);
                Message::Request(request)
            }
            Err(e) => Message::Invalid {
                id,
                reason: e.to_string(),
            },
        };
    }

    if object.contains_key("result") || object.contains_key("error") {
        if let Ok(response) = serde_json::from_value::<JsonRpcResponse>(value) {
            debug!("Received response: id={:?}", response.id);
            return Message::Response(response);
        }
        return Message::Invalid {
            id,
            reason: "malformed response".into(),
        };
    }

    Message::Invalid {
        id,
        reason: "missing method".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::RequestId;
    use tokio::io::{AsyncReadExt, duplex};

    #[test]
    fn test_request_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let request: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.method, "initialize");
        assert_eq!(request.id, Some(RequestId::Number(1)));
    }

    #[tokio::test]
    async fn test_reads_lines_and_skips_blanks() {
        let input: &[u8] = b"\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n";
        let transport = LineTransport::new(input, Vec::new());

        match transport.read_message().await.unwrap() {
            Some(Message::Request(request)) => assert_eq!(request.method, "ping"),
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(transport.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let input: &[u8] = b"{not json}\n";
        let transport = LineTransport::new(input, Vec::new());

        let err = transport.read_message().await.unwrap_err();
        assert!(matches!(err, McpError::Protocol(ProtocolError::ParseError)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_costs_only_that_line() {
        let input: &[u8] = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\xff\"}\n\
            {\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n";
        let transport = LineTransport::new(input, Vec::new());

        let err = transport.read_message().await.unwrap_err();
        assert!(matches!(err, McpError::Protocol(ProtocolError::ParseError)));

        match transport.read_message().await.unwrap() {
            Some(Message::Request(request)) => assert_eq!(request.id, Some(RequestId::Number(2))),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_requests_are_invalid() {
        let input: &[u8] = b"{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":42}\n\
            {\"jsonrpc\":\"2.0\",\"id\":8}\n\
            [1,2]\n";
        let transport = LineTransport::new(input, Vec::new());

        for expected in [Some(RequestId::Number(7)), Some(RequestId::Number(8)), None] {
            match transport.read_message().await.unwrap() {
                Some(Message::Invalid { id, .. }) => assert_eq!(id, expected),
                other => panic!("unexpected message: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_response_is_classified() {
        let input: &[u8] = b"{\"jsonrpc\":\"2.0\",\"id\":3,\"result\":{}}\n";
        let transport = LineTransport::new(input, Vec::new());

        assert!(matches!(
            transport.read_message().await.unwrap(),
            Some(Message::Response(_))
        ));
    }

    #[tokio::test]
    async fn test_write_response_appends_newline() {
        let (client, server) = duplex(1024);
        let transport = LineTransport::new(&b""[..], server);

        let response = JsonRpcResponse::success(Some(1.into()), serde_json::json!({}));
        transport.write_response(&response).await.unwrap();
        drop(transport);

        let mut written = String::new();
        let mut client = client;
        client.read_to_string(&mut written).await.unwrap();
        assert!(written.ends_with('\n'));
        assert!(written.contains("\"id\":1"));
    }
}
