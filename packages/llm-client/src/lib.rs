//! Minimal client for OpenAI-compatible endpoints
//!
//! Covers `POST {base_url}/chat/completions` and `POST {base_url}/embeddings`.
//! Chat completions are not interpreted: the body comes back verbatim as a
//! [`RawCompletion`] so callers can apply their own parsing rules.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm_client::{ChatRequest, EmbeddingRequest, LlmClient, Message};
//!
//! let client = LlmClient::new("http://localhost:8000/v1");
//!
//! let raw = client.chat_completion(
//!     ChatRequest::new("deepseek.v3-v1:0")
//!         .message(Message::system("You are a literary analyst."))
//!         .message(Message::user("Name the genre of this text."))
//!         .temperature(0.0)
//!         .top_p(0.9)
//!         .seed(69420),
//! ).await?;
//!
//! let vectors = client
//!     .create_embeddings(EmbeddingRequest::new("text-embedding-3-small", ["Aass-Nag"]))
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{Endpoint, LlmError, Result};
pub use types::*;

use reqwest::Client;
use tracing::{debug, warn};

/// Client for one OpenAI-compatible base URL.
#[derive(Clone)]
pub struct LlmClient {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl LlmClient {
    /// Create a new client for the given base URL (e.g. `https://host/v1`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: None,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create from environment variables `LLM_BASE_URL` and optional `LLM_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("LLM_BASE_URL")
            .map_err(|_| LlmError::Config("LLM_BASE_URL not set".into()))?;
        let client = Self::new(base_url);
        Ok(match std::env::var("LLM_API_KEY") {
            Ok(key) if !key.is_empty() => client.with_api_key(key),
            _ => client,
        })
    }

    /// Send a bearer token with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// One request, no retry. Non-2xx responses become [`LlmError::Api`].
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<RawCompletion> {
        let start = std::time::Instant::now();
        let body = self.post(Endpoint::ChatCompletions, &request).await?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            body_len = body.len(),
            "Chat completion"
        );

        Ok(RawCompletion::new(body))
    }

    /// Embed every input in one request. Vectors come back in input order.
    pub async fn create_embeddings(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>> {
        if request.input.is_empty() {
            return Ok(Vec::new());
        }

        let body = self.post(Endpoint::Embeddings, &request).await?;
        let response: types::EmbeddingResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Parse {
                endpoint: Endpoint::Embeddings,
                message: e.to_string(),
            })?;

        let inputs = request.input.len();
        let vectors = response.into_vectors(inputs).ok_or_else(|| LlmError::Parse {
            endpoint: Endpoint::Embeddings,
            message: format!("expected one embedding per input ({})", inputs),
        })?;

        debug!(model = %request.model, inputs, "Embeddings");
        Ok(vectors)
    }

    async fn post<B: serde::Serialize>(&self, endpoint: Endpoint, body: &B) -> Result<String> {
        let mut builder = self
            .http_client
            .post(format!("{}{}", self.base_url, endpoint.path()))
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.json(body).send().await.map_err(|source| {
            warn!(endpoint = %endpoint, error = %source, "LLM request failed");
            LlmError::Network { endpoint, source }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(endpoint = %endpoint, status = %status, error = %error_text, "LLM API error");
            return Err(LlmError::Api {
                endpoint,
                status: status.as_u16(),
                body: error_text,
            });
        }

        response
            .text()
            .await
            .map_err(|source| LlmError::Network { endpoint, source })
    }
}
