//! Request and response types for chat completions and embeddings.

use serde::{Deserialize, Serialize};

// =============================================================================
// Chat Completion
// =============================================================================

/// Chat completion request.
///
/// Serializes to `{model, messages, temperature, top_p, seed}`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier understood by the endpoint
    pub model: String,

    /// Conversation messages
    pub messages: Vec<Message>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling mass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Sampling seed, for reproducible completions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ChatRequest {
    /// Create a new chat request with the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            top_p: None,
            seed: None,
        }
    }

    /// Add a message to the conversation.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set top_p.
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the sampling seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user", "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Raw completion body exactly as returned by the endpoint.
///
/// The client does not read it; callers apply their own parsing rules.
#[derive(Debug, Clone)]
pub struct RawCompletion {
    /// Response body text
    pub body: String,
}

impl RawCompletion {
    /// Wrap a response body.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

// =============================================================================
// Embeddings
// =============================================================================

/// Embedding request for one or more inputs.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: Vec<String>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            model: model.into(),
            input: input.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingData {
    pub index: usize,
    pub embedding: Vec<f32>,
}

impl EmbeddingResponse {
    /// Vectors in input order, or `None` unless there is exactly one per input.
    pub(crate) fn into_vectors(mut self, inputs: usize) -> Option<Vec<Vec<f32>>> {
        self.data.sort_by_key(|d| d.index);
        let in_order = self.data.iter().enumerate().all(|(i, d)| d.index == i);
        if self.data.len() != inputs || !in_order {
            return None;
        }
        Some(self.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let sys = Message::system("You are helpful");
        assert_eq!(sys.role, "system");

        let user = Message::user("Hello");
        assert_eq!(user.role, "user");
    }

    #[test]
    fn test_chat_request_serializes_sampling_params() {
        let req = ChatRequest::new("deepseek.v3-v1:0")
            .message(Message::system("sys"))
            .message(Message::user("hi"))
            .temperature(0.0)
            .top_p(0.9)
            .seed(69420);

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["model"], "deepseek.v3-v1:0");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["seed"], 69420);
        assert!((body["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_unset_sampling_params_are_omitted() {
        let body = serde_json::to_value(ChatRequest::new("m")).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("seed").is_none());
    }

    #[test]
    fn test_embedding_request_body() {
        let body =
            serde_json::to_value(EmbeddingRequest::new("text-embedding-3-small", ["a", "b"])).unwrap();
        assert_eq!(body["model"], "text-embedding-3-small");
        assert_eq!(body["input"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_embedding_response_is_reordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.25]}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_vectors(2), Some(vec![vec![0.25], vec![0.5]]));
    }

    #[test]
    fn test_embedding_response_with_missing_vectors() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"index":0,"embedding":[0.25]}]}"#).unwrap();
        assert_eq!(response.into_vectors(2), None);
    }
}
