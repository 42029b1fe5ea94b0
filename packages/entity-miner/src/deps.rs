//! Collaborators a mining run needs, behind traits so tests can swap them.

use std::sync::Arc;

use crate::traits::{
    blob_store::BlobStore, job_store::JobStore, model::ModelInvoker,
    template_store::TemplateStore, vector_store::VectorStore,
};

/// Shared handles to every external collaborator.
#[derive(Clone)]
pub struct MinerDeps {
    pub templates: Arc<dyn TemplateStore>,
    pub model: Arc<dyn ModelInvoker>,
    pub vectors: Arc<dyn VectorStore>,
    /// Uploaded texts (blob-store events and the story endpoints)
    pub blobs: Arc<dyn BlobStore>,
    pub jobs: Arc<dyn JobStore>,
}

impl MinerDeps {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        model: Arc<dyn ModelInvoker>,
        vectors: Arc<dyn VectorStore>,
        blobs: Arc<dyn BlobStore>,
        jobs: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            templates,
            model,
            vectors,
            blobs,
            jobs,
        }
    }

    /// In-memory stores around the given templates and model.
    pub fn in_memory(templates: Arc<dyn TemplateStore>, model: Arc<dyn ModelInvoker>) -> Self {
        use crate::stores::{MemoryBlobStore, MemoryJobStore, MemoryVectorStore};

        Self::new(
            templates,
            model,
            Arc::new(MemoryVectorStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryJobStore::new()),
        )
    }
}
