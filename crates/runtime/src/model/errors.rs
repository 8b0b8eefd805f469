use thiserror::Error;

/// Errors from model inference calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred while reaching the model host.
    #[error("network: {0}")]
    Network(String),

    /// The model host returned an error response.
    #[error("model api: {0}")]
    Api(String),

    /// The model host response could not be parsed.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}
