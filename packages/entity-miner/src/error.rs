//! Typed errors for the entity miner.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell a
//! missing template apart from a model that answered with garbage.

use thiserror::Error;

/// Errors that can occur while mining a text.
#[derive(Debug, Error)]
pub enum MinerError {
    /// Missing or malformed prompt templates
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required call parameter was empty
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Model output could not be parsed or did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Network or service failure talking to the model endpoint
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Template, vector, blob or job store failure
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Genre detection or entity extraction failed; the whole run is aborted
    #[error("workflow failed during {stage}: {source}")]
    Workflow {
        stage: &'static str,
        #[source]
        source: Box<MinerError>,
    },
}

impl MinerError {
    /// Wrap a stage failure as a fatal workflow error.
    pub fn workflow(stage: &'static str, source: MinerError) -> Self {
        Self::Workflow {
            stage,
            source: Box::new(source),
        }
    }

    /// Stable snake_case name of the error kind, as reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Parse(_) => "parse_error",
            Self::Transport(_) => "transport_error",
            Self::Storage(_) => "storage_error",
            Self::Workflow { .. } => "workflow_error",
        }
    }

    /// Convenience constructor for storage failures described by a message.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into().into())
    }
}

impl From<serde_json::Error> for MinerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

#[cfg(feature = "hosted")]
impl From<llm_client::LlmError> for MinerError {
    fn from(e: llm_client::LlmError) -> Self {
        match e {
            llm_client::LlmError::Config(msg) => Self::InvalidArgument(msg),
            e @ llm_client::LlmError::Parse { .. } => Self::Parse(e.to_string()),
            other => Self::Transport(Box::new(other)),
        }
    }
}

/// Result type alias for miner operations.
pub type Result<T> = std::result::Result<T, MinerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_error_keeps_stage_and_cause() {
        let err = MinerError::workflow("genre", MinerError::Parse("bad json".into()));
        assert_eq!(err.kind(), "workflow_error");
        assert_eq!(
            err.to_string(),
            "workflow failed during genre: parse error: bad json"
        );
    }

    #[test]
    fn test_kinds_are_snake_case() {
        assert_eq!(
            MinerError::Configuration("x".into()).kind(),
            "configuration_error"
        );
        assert_eq!(MinerError::storage("down").kind(), "storage_error");
    }

    #[cfg(feature = "hosted")]
    #[test]
    fn test_llm_errors_map_to_kinds() {
        use llm_client::{Endpoint, LlmError};

        let api = LlmError::Api {
            endpoint: Endpoint::ChatCompletions,
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(MinerError::from(api).kind(), "transport_error");

        let parse = LlmError::Parse {
            endpoint: Endpoint::Embeddings,
            message: "expected one embedding per input (2)".into(),
        };
        assert_eq!(MinerError::from(parse).kind(), "parse_error");
    }
}
