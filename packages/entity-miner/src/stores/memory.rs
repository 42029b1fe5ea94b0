//! In-memory stores for testing and development.
//!
//! Not suitable for production: data is lost on restart.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{MinerError, Result};
use crate::traits::{
    blob_store::{BlobObject, BlobStore},
    job_store::{JobRecord, JobStore},
    template_store::TemplateStore,
    vector_store::{DocumentBatch, Metadata, VectorHit, VectorStore},
};
use crate::types::template::PromptTemplate;

// =============================================================================
// Templates
// =============================================================================

/// Templates keyed by (scope, template_type).
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<(String, String), PromptTemplate>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with templates.
    pub fn with_templates(templates: impl IntoIterator<Item = PromptTemplate>) -> Self {
        let store = Self::new();
        for template in templates {
            store.insert(template);
        }
        store
    }

    /// Load a JSON array of template records.
    pub fn from_json(json: &str) -> Result<Self> {
        let templates: Vec<PromptTemplate> = serde_json::from_str(json)?;
        Ok(Self::with_templates(templates))
    }

    /// Load a JSON file holding an array of template records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MinerError::Configuration(format!("cannot read templates from {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn insert(&self, template: PromptTemplate) {
        let key = (template.scope_key.clone(), template.template_type.clone());
        self.templates.write().unwrap().insert(key, template);
    }

    /// Remove every template of a type, in all scopes.
    pub fn remove(&self, template_type: &str) {
        self.templates
            .write()
            .unwrap()
            .retain(|(_, t), _| t != template_type);
    }

    pub fn len(&self) -> usize {
        self.templates.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn get(&self, scope: &str, template_type: &str) -> Result<Option<PromptTemplate>> {
        Ok(self
            .templates
            .read()
            .unwrap()
            .get(&(scope.to_string(), template_type.to_string()))
            .cloned())
    }

    async fn put(&self, template: &PromptTemplate) -> Result<()> {
        self.insert(template.clone());
        Ok(())
    }

    async fn list(&self, scope: &str) -> Result<Vec<PromptTemplate>> {
        let mut templates: Vec<_> = self
            .templates
            .read()
            .unwrap()
            .values()
            .filter(|t| t.scope_key == scope)
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.template_type.cmp(&b.template_type));
        Ok(templates)
    }
}

// =============================================================================
// Vectors
// =============================================================================

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    content: String,
    metadata: Metadata,
}

/// Vector store ranking by token overlap instead of embeddings.
///
/// Distance is `1 - (shared tokens / query tokens)`, so an exact topical match
/// is 0 and an unrelated document is 1.
#[derive(Default)]
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
    add_calls: AtomicUsize,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap()
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Ids in a collection, in insertion order.
    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .read()
            .unwrap()
            .get(collection)
            .map(|docs| docs.iter().map(|d| d.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of `add` calls made, including failed ones.
    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Get a document by id.
    pub fn get(&self, collection: &str, id: &str) -> Option<VectorHit> {
        self.collections
            .read()
            .unwrap()
            .get(collection)?
            .iter()
            .find(|d| d.id == id)
            .map(|d| VectorHit {
                id: d.id.clone(),
                content: d.content.clone(),
                metadata: d.metadata.clone(),
                distance: None,
            })
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add(&self, collection: &str, batch: DocumentBatch) -> Result<()> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        batch.validate()?;

        let mut collections = self.collections.write().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();

        let DocumentBatch {
            documents,
            metadatas,
            ids,
        } = batch;
        for ((id, content), metadata) in ids.into_iter().zip(documents).zip(metadatas) {
            let document = StoredDocument {
                id,
                content,
                metadata,
            };
            match docs.iter_mut().find(|d| d.id == document.id) {
                Some(existing) => *existing = document,
                None => docs.push(document),
            }
        }

        Ok(())
    }

    async fn query(&self, collection: &str, text: &str, k: usize) -> Result<Vec<VectorHit>> {
        let query = tokens(text);
        let collections = self.collections.read().unwrap();
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<VectorHit> = docs
            .iter()
            .map(|d| {
                let shared = tokens(&d.content).intersection(&query).count();
                let score = if query.is_empty() {
                    0.0
                } else {
                    shared as f32 / query.len() as f32
                };
                VectorHit {
                    id: d.id.clone(),
                    content: d.content.clone(),
                    metadata: d.metadata.clone(),
                    distance: Some(1.0 - score),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

// =============================================================================
// Blobs
// =============================================================================

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<(String, String), BlobObject>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<BlobObject>> {
        Ok(self
            .objects
            .read()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn put_object(&self, bucket: &str, key: &str, object: BlobObject) -> Result<()> {
        self.objects
            .write()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), object);
        Ok(())
    }
}

// =============================================================================
// Jobs
// =============================================================================

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn put(&self, record: &JobRecord) -> Result<()> {
        self.jobs
            .write()
            .unwrap()
            .insert(record.job_id, record.clone());
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<JobRecord>> {
        Ok(self.jobs.read().unwrap().get(&job_id).cloned())
    }
}
