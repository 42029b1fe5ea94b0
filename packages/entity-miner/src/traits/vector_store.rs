//! Vector store for profile documents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MinerError, Result};

/// Per-document metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Parallel arrays of documents, metadata and ids, written in one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentBatch {
    pub documents: Vec<String>,
    pub metadatas: Vec<Metadata>,
    pub ids: Vec<String>,
}

impl DocumentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one document.
    pub fn push(&mut self, id: impl Into<String>, document: impl Into<String>, metadata: Metadata) {
        self.ids.push(id.into());
        self.documents.push(document.into());
        self.metadatas.push(metadata);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The three arrays must line up.
    pub fn validate(&self) -> Result<()> {
        if self.documents.len() != self.ids.len() || self.metadatas.len() != self.ids.len() {
            return Err(MinerError::InvalidArgument(format!(
                "batch arrays differ in length: {} ids, {} documents, {} metadatas",
                self.ids.len(),
                self.documents.len(),
                self.metadatas.len()
            )));
        }
        Ok(())
    }
}

/// One query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    /// Smaller is closer. `None` when the backend reports no distance.
    pub distance: Option<f32>,
}

/// A collection-scoped document store with similarity search.
///
/// Collections are created on first write.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Add (or replace by id) a batch of documents.
    ///
    /// Whether a failed batch leaves partial writes behind is up to the
    /// backend.
    async fn add(&self, collection: &str, batch: DocumentBatch) -> Result<()>;

    /// The `k` documents closest to `text`, closest first.
    async fn query(&self, collection: &str, text: &str, k: usize) -> Result<Vec<VectorHit>>;
}
