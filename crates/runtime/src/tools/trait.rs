//! Tool host trait.

use crate::tools::{ToolCall, ToolDescriptor, ToolError, ToolResult};
use std::future::Future;

/// Trait for tool execution hosts.
///
/// This is the boundary between the orchestration loop and side effects.
pub trait ToolHost: Send + Sync {
    /// Fetch the tools the host currently advertises.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolDescriptor>, ToolError>> + Send;

    /// Execute a tool call.
    fn call_tool(
        &self,
        call: &ToolCall,
    ) -> impl Future<Output = Result<ToolResult, ToolError>> + Send;

    /// Release the host's resources.
    fn shutdown(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}
