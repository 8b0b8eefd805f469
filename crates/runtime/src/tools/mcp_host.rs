//! MCP-backed tool host.

use super::{ToolCall, ToolDescriptor, ToolError, ToolHost, ToolResult};
use mcp::{Client, ServerConfig};
use serde_json::Value;
use tracing::{debug, info};

/// Tool host backed by a spawned MCP server process.
pub struct McpToolHost {
    client: Client,
}

impl McpToolHost {
    /// Spawn the server and complete the MCP handshake.
    ///
    /// If the handshake fails the child process is dropped, which kills it.
    pub async fn connect(config: ServerConfig) -> Result<Self, ToolError> {
        let name = config.name.clone();
        let client = Client::spawn(config)
            .await
            .map_err(|e| ToolError::Connection(format!("failed to start {name}: {e}")))?;

        let init = client
            .initialize()
            .await
            .map_err(|e| ToolError::Connection(format!("failed to initialize {name}: {e}")))?;

        info!(server = %init.server_info.name, "connected to tool host");
        Ok(Self { client })
    }

    /// Name of the underlying server.
    pub fn name(&self) -> &str {
        self.client.name()
    }
}

impl ToolHost for McpToolHost {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let tools = self
            .client
            .list_tools()
            .await
            .map_err(|e| ToolError::Connection(e.to_string()))?;

        Ok(tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        debug!(tool = %call.name, "calling tool");
        let result = self
            .client
            .call_tool(&call.name, Some(Value::Object(call.input.clone())))
            .await
            .map_err(|e| map_call_error(&call.name, e))?;

        Ok(ToolResult::new(result.joined_text()))
    }

    async fn shutdown(self) {
        let name = self.client.name().to_string();
        if let Err(e) = self.client.shutdown().await {
            debug!(server = %name, "shutdown: {e}");
        }
    }
}

fn map_call_error(tool: &str, error: mcp::Error) -> ToolError {
    match error {
        mcp::Error::ToolCallFailed(reason) => ToolError::Execution(reason),
        mcp::Error::ToolNotFound(name) => ToolError::NotFound(name),
        mcp::Error::JsonRpc(rpc) if rpc.code == mcp::codes::INVALID_PARAMS => {
            ToolError::InvalidInput(format!("{tool}: {}", rpc.message))
        }
        e if e.is_connection_failure() => ToolError::Connection(e.to_string()),
        e => ToolError::Execution(e.to_string()),
    }
}
