//! Quotebot runtime: query routing between a local model and an MCP tool host.
//!
//! # Overview
//!
//! - **QueryClassifier**: a keyword/ticker pre-filter deciding whether a
//!   query may need a tool at all.
//! - **Backend**: a trait over model hosts; [`OllamaBackend`] is the one
//!   shipped implementation.
//! - **ToolHost**: a trait over tool servers; [`McpToolHost`] talks MCP to a
//!   child process.
//! - **Session**: owns the tool host for the client's lifetime and checks
//!   every call against the advertised tools.
//! - **Orchestrator**: runs each query through classify, route, execute
//!   and narrate.
//!
//! # Example
//!
//! ```ignore
//! use mcp::ServerConfig;
//! use runtime::{McpToolHost, OllamaBackend, Orchestrator, Session};
//!
//! # async fn example() -> runtime::Result<()> {
//! let host = McpToolHost::connect(ServerConfig::for_script("quote_server.py")).await?;
//! let backend = OllamaBackend::builder().build()?;
//! let mut orchestrator = Orchestrator::new(backend, Session::new(host), "llama3.2");
//!
//! let answer = orchestrator.process_query("What's AAPL trading at?").await?;
//! println!("{}", answer.text);
//!
//! orchestrator.into_session().close().await;
//! # Ok(())
//! # }
//! ```

mod classifier;
mod discovery;
mod error;
pub mod model;
mod orchestrator;
mod parser;
mod prompt;
pub mod providers;
mod session;
pub mod tools;

pub use classifier::{Classification, QueryClassifier, RoutingRules};
pub use discovery::ToolDiscovery;
pub use error::{Error, Result};
pub use model::{Backend, Message, ModelError, ModelRequest, ModelResponse, Role, Usage};
pub use orchestrator::{Answer, Orchestrator, Route, UNPARSEABLE_MESSAGE};
pub use parser::{Decision, parse};
pub use prompt::{CallExample, GENERAL_QUERY, PromptBuilder, PromptMode};
pub use providers::{OllamaBackend, OllamaBackendBuilder};
pub use session::Session;
pub use tools::{McpToolHost, ToolCall, ToolDescriptor, ToolError, ToolHost, ToolResult};
