//! Server side: answer MCP requests on a line-delimited stream.
//!
//! The loop is transport-agnostic; binaries hand it stdin/stdout, tests hand
//! it an in-memory duplex pipe.

use std::future::Future;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, IncomingMessage, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId,
    ServerCapabilities, ServerInfo, Tool, ToolsCapability, codes,
};

/// A set of tools served over MCP.
pub trait ToolService: Send + Sync {
    /// Name and version reported during initialization.
    fn info(&self) -> ServerInfo;

    /// Tools advertised by `tools/list`.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool.
    ///
    /// Return `Error::ToolNotFound` for unknown names; failures inside a known
    /// tool should come back as a `CallToolResult` with `is_error` set.
    fn call(
        &self,
        name: &str,
        arguments: Value,
    ) -> impl Future<Output = Result<CallToolResult>> + Send;
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub async fn serve<S, R, W>(service: &S, reader: R, mut writer: W) -> Result<()>
where
    S: ToolService,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    info!(server = %service.info().name, "MCP server ready");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message: IncomingMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!("unparseable request: {e}");
                let id = recover_id(line);
                let error = JsonRpcError::new(codes::PARSE_ERROR, format!("parse error: {e}"));
                write_response(&mut writer, &JsonRpcResponse::failure(id, error)).await?;
                continue;
            }
        };

        let Some(id) = message.id.clone() else {
            debug!(method = %message.method, "notification");
            continue;
        };

        let response = match dispatch(service, &message).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        };
        write_response(&mut writer, &response).await?;
    }

    info!("MCP client closed the stream");
    Ok(())
}

async fn dispatch<S: ToolService>(
    service: &S,
    message: &IncomingMessage,
) -> std::result::Result<Value, JsonRpcError> {
    if message.jsonrpc != "2.0" {
        return Err(JsonRpcError::new(
            codes::INVALID_REQUEST,
            "expected jsonrpc \"2.0\"",
        ));
    }

    match message.method.as_str() {
        "initialize" => {
            let params: InitializeParams = parse_params(message.params.clone())?;
            debug!(client = %params.client_info.name, "initialize");
            let protocol_version = if params.protocol_version.is_empty() {
                PROTOCOL_VERSION.to_string()
            } else {
                params.protocol_version
            };
            to_value(InitializeResult {
                protocol_version,
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability::default()),
                },
                server_info: service.info(),
            })
        }
        "ping" => Ok(serde_json::json!({})),
        "tools/list" => to_value(ListToolsResult {
            tools: service.tools(),
        }),
        "tools/call" => {
            let params: CallToolParams = parse_params(message.params.clone())?;
            let arguments = params
                .arguments
                .unwrap_or_else(|| Value::Object(Default::default()));
            debug!(tool = %params.name, "tools/call");

            match service.call(&params.name, arguments).await {
                Ok(result) => to_value(result),
                Err(Error::ToolNotFound(name)) => Err(JsonRpcError::new(
                    codes::INVALID_PARAMS,
                    format!("unknown tool: {name}"),
                )),
                Err(e) => {
                    warn!(tool = %params.name, "tool failed: {e}");
                    to_value(CallToolResult::error(e.to_string()))
                }
            }
        }
        other => Err(JsonRpcError::new(
            codes::METHOD_NOT_FOUND,
            format!("method not found: {other}"),
        )),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: Option<Value>,
) -> std::result::Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::new(codes::INVALID_PARAMS, "missing params"))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::new(codes::INVALID_PARAMS, format!("invalid params: {e}")))
}

fn to_value(result: impl serde::Serialize) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(result)
        .map_err(|e| JsonRpcError::new(codes::INTERNAL_ERROR, format!("serialize result: {e}")))
}

/// Best-effort id extraction from a line that failed to parse as a request.
fn recover_id(line: &str) -> Option<RequestId> {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|v| v.get("id").cloned())
        .and_then(|id| serde_json::from_value(id).ok())
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{BufReader, duplex};

    struct EchoService;

    impl ToolService for EchoService {
        fn info(&self) -> ServerInfo {
            ServerInfo {
                name: "echo".into(),
                version: Some("0.0.1".into()),
            }
        }

        fn tools(&self) -> Vec<Tool> {
            vec![Tool {
                name: "echo".into(),
                description: Some("Echo the message back".into()),
                input_schema: json!({
                    "type": "object",
                    "properties": {"message": {"type": "string"}},
                    "required": ["message"]
                }),
            }]
        }

        async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
            if name != "echo" {
                return Err(Error::ToolNotFound(name.to_string()));
            }
            match arguments.get("message").and_then(Value::as_str) {
                Some(message) => Ok(CallToolResult::text(message)),
                None => Ok(CallToolResult::error("missing argument: message")),
            }
        }
    }

    /// Feed `requests` to the serve loop and collect every response line.
    async fn exchange(requests: &[Value]) -> Vec<Value> {
        let (client, server) = duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let task = tokio::spawn(async move {
            serve(&EchoService, BufReader::new(server_read), server_write).await
        });

        let (client_read, mut client_write) = tokio::io::split(client);
        for request in requests {
            let line = format!("{request}\n");
            client_write.write_all(line.as_bytes()).await.unwrap();
        }
        client_write.shutdown().await.unwrap();
        drop(client_write);

        let mut responses = Vec::new();
        let mut lines = BufReader::new(client_read).lines();
        while let Some(line) = lines.next_line().await.unwrap() {
            responses.push(serde_json::from_str(&line).unwrap());
        }
        task.await.unwrap().unwrap();
        responses
    }

    #[tokio::test]
    async fn initialize_then_list_tools() {
        let responses = exchange(&[
            json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{
                "protocolVersion":"2024-11-05","capabilities":{},
                "clientInfo":{"name":"test","version":"1"}}}),
            json!({"jsonrpc":"2.0","method":"notifications/initialized"}),
            json!({"jsonrpc":"2.0","id":2,"method":"tools/list"}),
        ])
        .await;

        // The notification gets no response
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "echo");
        assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
        assert!(responses[0]["result"]["capabilities"]["tools"].is_object());
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["tools"][0]["name"], "echo");
        assert!(responses[1]["result"]["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn call_tool_success_and_tool_error() {
        let responses = exchange(&[
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"echo","arguments":{"message":"hi"}}}),
            json!({"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo"}}),
        ])
        .await;

        assert_eq!(responses[0]["result"]["content"][0]["text"], "hi");
        assert_eq!(responses[0]["result"]["isError"], false);
        assert_eq!(responses[1]["result"]["isError"], true);
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let responses = exchange(&[json!({"jsonrpc":"2.0","id":"x","method":"tools/call",
                   "params":{"name":"nope","arguments":{}}})])
        .await;

        assert_eq!(responses[0]["id"], "x");
        assert_eq!(responses[0]["error"]["code"], codes::INVALID_PARAMS);
        assert_eq!(responses[0]["error"]["message"], "unknown tool: nope");
    }

    #[tokio::test]
    async fn unknown_method_and_garbage() {
        let (client, server) = duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let task = tokio::spawn(async move {
            serve(&EchoService, BufReader::new(server_read), server_write).await
        });

        let (client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(b"not json\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"resources/list\"}\n")
            .await
            .unwrap();
        client_write.shutdown().await.unwrap();
        drop(client_write);

        let mut lines = BufReader::new(client_read).lines();
        let first: Value =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        let second: Value =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(first["error"]["code"], codes::PARSE_ERROR);
        assert!(first["id"].is_null());
        assert_eq!(second["id"], 7);
        assert_eq!(second["error"]["code"], codes::METHOD_NOT_FOUND);
    }
}
