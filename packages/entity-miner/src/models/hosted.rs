//! Model invoker and embedder backed by an OpenAI-compatible endpoint.

use async_trait::async_trait;
use llm_client::{ChatRequest, EmbeddingRequest, LlmClient, Message};
use tracing::error;

use crate::error::Result;
use crate::traits::embedder::{check_batch, Embedder};
use crate::traits::model::{InvocationRequest, ModelInvoker, RawResponse};

/// Sends each invocation as one chat completion with a system and a user
/// message.
#[derive(Clone)]
pub struct HostedModel {
    client: LlmClient,
}

impl HostedModel {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Build from `LLM_BASE_URL` and optional `LLM_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(LlmClient::from_env()?))
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }
}

/// The chat request an invocation is sent as.
pub fn chat_request(request: &InvocationRequest) -> ChatRequest {
    ChatRequest::new(&request.model_id)
        .message(Message::system(&request.system_prompt))
        .message(Message::user(&request.instruction_prompt))
        .temperature(request.sampling.temperature)
        .top_p(request.sampling.top_p)
        .seed(request.sampling.seed)
}

#[async_trait]
impl ModelInvoker for HostedModel {
    async fn invoke(&self, request: &InvocationRequest) -> Result<RawResponse> {
        let completion = self
            .client
            .chat_completion(chat_request(request))
            .await
            .map_err(|e| {
                error!(model_id = %request.model_id, error = %e, "Model invocation failed");
                e
            })?;

        Ok(RawResponse::new(completion.body))
    }
}

/// Embeds through the endpoint's `/embeddings` route.
#[derive(Clone)]
pub struct HostedEmbedder {
    client: LlmClient,
    model: String,
}

impl HostedEmbedder {
    pub fn new(client: LlmClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for HostedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        Ok(vectors.remove(0))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let vectors = self
            .client
            .create_embeddings(EmbeddingRequest::new(&self.model, texts.iter().copied()))
            .await
            .map_err(|e| {
                error!(model = %self.model, inputs = texts.len(), error = %e, "Embedding failed");
                e
            })?;
        check_batch(texts.len(), &vectors)?;
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config::SamplingParams;

    fn request() -> InvocationRequest {
        InvocationRequest::new(
            "deepseek.v3-v1:0",
            "You are a literary analyst.",
            "Name the genre.",
            SamplingParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_chat_request_shape() {
        let body = serde_json::to_value(chat_request(&request())).unwrap();

        assert_eq!(body["model"], "deepseek.v3-v1:0");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Name the genre.");
        assert_eq!(body["seed"], 69420);
        assert_eq!(body["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let model = HostedModel::new(LlmClient::new("http://127.0.0.1:9/v1"));
        let err = model.invoke(&request()).await.unwrap_err();
        assert_eq!(err.kind(), "transport_error");
    }

    #[tokio::test]
    async fn test_unreachable_embedder_is_transport_error() {
        let embedder =
            HostedEmbedder::new(LlmClient::new("http://127.0.0.1:9/v1"), "text-embedding-3-small");
        let err = embedder.embed("Aass-Nag").await.unwrap_err();
        assert_eq!(err.kind(), "transport_error");
    }
}
