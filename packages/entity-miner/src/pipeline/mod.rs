//! The mining pipeline.
//!
//! - [`response`] - fenced-JSON extraction and typed parsing
//! - [`prompts`] - typed placeholder binding
//! - [`templates`] - template lookup
//! - [`stages`] - genre, extraction and profiling stage functions
//! - [`workflow`] - the orchestrator
//! - [`persist`] - the vector store sink

pub mod persist;
pub mod prompts;
pub mod response;
pub mod stages;
pub mod templates;
pub mod workflow;

pub use persist::{collection_name, document_id, ProfileSink};
pub use response::{parse_response, ModelOutput};
pub use workflow::{EntityMiningWorkflow, EXTRACTION_STAGE, GENRE_STAGE};
