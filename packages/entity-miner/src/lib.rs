//! Narrative Entity Miner
//!
//! Extracts, classifies and profiles the people, places, events, objects and
//! organizations of long-form prose, and stores the profiles in a vector store
//! for later retrieval.
//!
//! # Pipeline
//!
//! ```text
//! text ─► genre ─► entity extraction ─► per-entity profiling (bounded) ─► vector store
//! ```
//!
//! Every stage is one model call driven by a prompt template. Genre and
//! extraction failures abort the run; a failed profile only drops its entity.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use entity_miner::{EntityMiningWorkflow, MinerConfig, MinerDeps, MemoryTemplateStore};
//! use entity_miner::testing::MockModel;
//!
//! let deps = MinerDeps::in_memory(
//!     Arc::new(MemoryTemplateStore::from_json_file("templates.json")?),
//!     Arc::new(MockModel::new()),
//! );
//! let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("deepseek.v3-v1:0")).await?;
//!
//! let mined = workflow.mine(&text).await?;
//! workflow.save("alice-novel1", &mined.profiled_entities, &mined.genre, "novel1").await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (TemplateStore, ModelInvoker, VectorStore, Embedder, ...)
//! - [`types`] - Templates, entities, profiles, configuration
//! - [`pipeline`] - Parsing, prompt binding, stages, workflow, persistence
//! - [`handler`] - Event shapes, the upload guard and structured outcomes
//! - [`stores`] - In-memory, filesystem and Chroma implementations
//! - [`models`] - Hosted model invoker and embedder (requires `hosted` feature)
//! - [`testing`] - Mock implementations for testing

pub mod deps;
pub mod error;
pub mod handler;
pub mod models;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use deps::MinerDeps;
pub use error::{MinerError, Result};
pub use handler::{handle_event, HandlerOutcome, MiningEvent, OutcomeStatus};
pub use pipeline::{collection_name, document_id, EntityMiningWorkflow, ProfileSink};
pub use traits::{
    blob_store::{BlobObject, BlobStore},
    embedder::Embedder,
    job_store::{JobRecord, JobStatus, JobStore},
    model::{InvocationRequest, ModelInvoker, RawResponse},
    template_store::TemplateStore,
    vector_store::{DocumentBatch, Metadata, VectorHit, VectorStore},
};
pub use types::{
    config::{MinerConfig, ProfilerSpec, SamplingParams},
    entity::{Category, EntityExtraction, ExtractedEntity, GenreResult, Significance},
    mined::{MinedResult, MiningStats},
    profile::{
        EntityProfile, EventProfile, LocationProfile, ObjectProfile, OrganizationProfile,
        PersonProfile,
    },
    template::{template_types, PromptTemplate, GLOBAL_SCOPE},
};

// Re-export stores
pub use stores::{
    ChromaVectorStore, FsBlobStore, MemoryBlobStore, MemoryJobStore, MemoryTemplateStore,
    MemoryVectorStore,
};

#[cfg(feature = "hosted")]
pub use models::{HostedEmbedder, HostedModel};
