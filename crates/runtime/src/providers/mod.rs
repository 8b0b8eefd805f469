//! Model inference providers.
//!
//! Each provider implements [`Backend`](crate::model::Backend) for its API.

mod ollama;

pub use ollama::{DEFAULT_BASE_URL, OllamaBackend, OllamaBackendBuilder};
