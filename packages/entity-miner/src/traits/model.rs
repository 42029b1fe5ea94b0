//! Model invocation.
//!
//! The invoker sends exactly two messages (system, user) plus sampling
//! parameters and hands back the endpoint's body untouched. Reading the body
//! is the response parser's job.

use async_trait::async_trait;

use crate::error::{MinerError, Result};
use crate::types::config::SamplingParams;

/// A validated model call.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub instruction_prompt: String,
    pub sampling: SamplingParams,
}

impl InvocationRequest {
    /// Build a request. Empty model id or prompts are rejected.
    pub fn new(
        model_id: impl Into<String>,
        system_prompt: impl Into<String>,
        instruction_prompt: impl Into<String>,
        sampling: SamplingParams,
    ) -> Result<Self> {
        let request = Self {
            model_id: model_id.into(),
            system_prompt: system_prompt.into(),
            instruction_prompt: instruction_prompt.into(),
            sampling,
        };

        if request.model_id.trim().is_empty() {
            tracing::error!("model_id is empty");
            return Err(MinerError::InvalidArgument(
                "model_id cannot be empty".into(),
            ));
        }
        if request.system_prompt.trim().is_empty() || request.instruction_prompt.trim().is_empty() {
            tracing::error!("system_prompt or instruction_prompt is empty");
            return Err(MinerError::InvalidArgument(
                "system_prompt and instruction_prompt cannot be empty".into(),
            ));
        }

        Ok(request)
    }
}

/// Raw endpoint response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub body: String,
}

impl RawResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Wrap message content in a single-choice completion body.
    pub fn from_content(content: &str) -> Self {
        Self::new(
            serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }]
            })
            .to_string(),
        )
    }
}

/// A hosted text-generation endpoint.
///
/// Implementations make one call per invocation and never retry.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, request: &InvocationRequest) -> Result<RawResponse>;
}
