use thiserror::Error;

use crate::model::ModelError;
use crate::tools::ToolError;

#[derive(Debug, Error)]
pub enum Error {
    /// The tool host is unreachable or tool discovery failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// A tool ran (or was asked to run) and failed.
    #[error("tool execution error: {reason}")]
    ToolExecution { reason: String },

    /// The model host failed to produce a completion.
    #[error("inference error: {0}")]
    Inference(#[from] ModelError),
}

impl From<ToolError> for Error {
    fn from(error: ToolError) -> Self {
        match error {
            ToolError::Connection(msg) => Error::Connection(msg),
            other => Error::ToolExecution {
                reason: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
