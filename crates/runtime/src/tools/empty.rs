//! Empty tool host implementation.

use crate::tools::{ToolCall, ToolDescriptor, ToolError, ToolHost, ToolResult};

/// A no-op tool host with no tools.
///
/// Every query routed to tools falls back to plain chat against it.
#[derive(Debug, Default)]
pub struct EmptyToolHost;

impl ToolHost for EmptyToolHost {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(Vec::new())
    }

    async fn call_tool(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        Err(ToolError::NotFound(call.name.clone()))
    }

    async fn shutdown(self) {}
}
