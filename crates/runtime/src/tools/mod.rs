//! Tool host boundary: descriptors, calls, and the hosts that run them.

mod empty;
pub mod errors;
mod mcp_host;
mod r#trait;
pub mod types;

pub use empty::EmptyToolHost;
pub use errors::ToolError;
pub use r#trait::ToolHost;
pub use mcp_host::McpToolHost;
pub use types::{ToolCall, ToolDescriptor, ToolInput, ToolResult};
