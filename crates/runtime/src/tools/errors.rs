use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while discovering or executing tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ToolError {
    /// The tool host is unreachable or the session is no longer usable.
    #[error("connection: {0}")]
    Connection(String),
    #[error("unknown tool: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    pub fn is_connection(&self) -> bool {
        matches!(self, ToolError::Connection(_))
    }
}
