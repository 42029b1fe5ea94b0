//! Trait abstractions for the external collaborators.

pub mod blob_store;
pub mod embedder;
pub mod job_store;
pub mod model;
pub mod template_store;
pub mod vector_store;
