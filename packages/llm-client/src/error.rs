//! Error types for the LLM client.

use std::fmt;

use thiserror::Error;

/// Result type for LLM client operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Endpoint a request was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ChatCompletions,
    Embeddings,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::ChatCompletions => "/chat/completions",
            Self::Embeddings => "/embeddings",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or invalid client settings
    #[error("LLM client misconfigured: {0}")]
    Config(String),

    /// The request never got an HTTP response
    #[error("{endpoint} request failed: {source}")]
    Network {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Api {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    /// 2xx response whose body is not the expected shape
    #[error("unexpected {endpoint} response: {message}")]
    Parse { endpoint: Endpoint, message: String },
}

impl LlmError {
    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Self::Config(_) => None,
            Self::Network { endpoint, .. }
            | Self::Api { endpoint, .. }
            | Self::Parse { endpoint, .. } => Some(*endpoint),
        }
    }
}
