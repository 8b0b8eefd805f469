//! Ollama chat backend.

use std::time::Duration;

use crate::model::{Backend, Message, ModelError, ModelRequest, ModelResponse, Usage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a local Ollama listens by default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a Message> for ApiMessage<'a> {
    fn from(message: &'a Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: &message.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    message: ApiResponseMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: String,
}

/// Builder for creating an Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaBackendBuilder {
    base_url: String,
    timeout: Duration,
}

impl Default for OllamaBackendBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OllamaBackendBuilder {
    /// Set the Ollama server URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the backend.
    pub fn build(self) -> Result<OllamaBackend, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;

        Ok(OllamaBackend {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Ollama `/api/chat` backend.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaBackend {
    /// Create a builder for the Ollama backend.
    pub fn builder() -> OllamaBackendBuilder {
        OllamaBackendBuilder::default()
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

impl std::fmt::Display for OllamaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ollama({})", self.base_url)
    }
}

impl Backend for OllamaBackend {
    async fn chat(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = ApiRequest {
            model: request.model,
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            stream: false,
        };

        debug!(
            model = request.model,
            messages = request.messages.len(),
            "sending chat request to Ollama"
        );

        let response = self
            .client
            .post(self.chat_url())
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let usage = Usage {
            input_tokens: api_response.prompt_eval_count,
            output_tokens: api_response.eval_count,
        };
        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Ollama completion received"
        );

        Ok(ModelResponse {
            content: api_response.message.content,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    async fn mock_ollama(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn sends_non_streaming_chat_and_reads_content() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                if body["stream"] != json!(false) {
                    return (StatusCode::BAD_REQUEST, Json(json!({"error": "stream"})));
                }
                let roles: Vec<&str> = body["messages"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|m| m["role"].as_str().unwrap())
                    .collect();
                let content = format!("{} {}", body["model"].as_str().unwrap(), roles.join(","));
                (
                    StatusCode::OK,
                    Json(json!({
                        "model": body["model"],
                        "message": {"role": "assistant", "content": content},
                        "done": true,
                        "prompt_eval_count": 12,
                        "eval_count": 3
                    })),
                )
            }),
        );
        let base_url = mock_ollama(router).await;
        let backend = OllamaBackend::builder().base_url(base_url).build().unwrap();

        let messages = [Message::system("be brief"), Message::user("hi")];
        let response = backend
            .chat(ModelRequest {
                model: "llama3.2",
                messages: &messages,
            })
            .await
            .unwrap();

        assert_eq!(response.content, "llama3.2 system,user");
        assert_eq!(response.usage.total_tokens(), 15);
    }

    #[tokio::test]
    async fn error_status_becomes_api_error() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::NOT_FOUND, "model \"nope\" not found") }),
        );
        let base_url = mock_ollama(router).await;
        let backend = OllamaBackend::builder().base_url(base_url).build().unwrap();

        let messages = [Message::user("hi")];
        let err = backend
            .chat(ModelRequest {
                model: "nope",
                messages: &messages,
            })
            .await
            .unwrap_err();

        match err {
            ModelError::Api(msg) => assert!(msg.contains("404"), "{msg}"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let backend = OllamaBackend::builder()
            .base_url("http://127.0.0.1:1")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let messages = [Message::user("hi")];
        let err = backend
            .chat(ModelRequest {
                model: "llama3.2",
                messages: &messages,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Network(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let backend = OllamaBackend::builder()
            .base_url("http://localhost:11434/")
            .build()
            .unwrap();
        assert_eq!(backend.chat_url(), "http://localhost:11434/api/chat");
        assert_eq!(backend.to_string(), "ollama(http://localhost:11434)");
    }
}
