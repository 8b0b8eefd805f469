//! MCP (Model Context Protocol) over stdio.
//!
//! Both halves of the protocol used by quotebot live here: a [`Client`] that
//! spawns a tool-host process and calls its tools, and a [`serve`] loop that
//! exposes a [`ToolService`] on any line-delimited stream.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Client, ServerConfig};
//!
//! # async fn example() -> mcp::Result<()> {
//! let client = Client::spawn(ServerConfig::for_script("target/release/quote-server")).await?;
//! client.initialize().await?;
//!
//! for tool in client.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let result = client
//!     .call_tool("get_stock_price", Some(serde_json::json!({ "symbol": "AAPL" })))
//!     .await?;
//! println!("{}", result.joined_text());
//!
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod protocol;
mod serve;

pub use client::{Client, DEFAULT_TIMEOUT, MAX_OUTPUT_SIZE, ServerConfig};
pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, IncomingMessage, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId,
    ServerCapabilities, ServerInfo, Tool, ToolContent, codes,
};
pub use serve::{ToolService, serve};
