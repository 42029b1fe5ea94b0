//! Chroma vector store over its REST API.
//!
//! Collections are resolved by name with `get_or_create` and their ids cached
//! for the lifetime of the store. The REST API does not embed, so documents
//! and query texts go through an [`Embedder`] first. Writes use `upsert` so a
//! re-mined profile replaces the stored one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::error::{MinerError, Result};
use crate::traits::embedder::{check_batch, Embedder};
use crate::traits::vector_store::{DocumentBatch, Metadata, VectorHit, VectorStore};

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: &'a [String],
    embeddings: Vec<Vec<f32>>,
    documents: &'a [String],
    metadatas: &'a [Metadata],
}

impl<'a> UpsertRequest<'a> {
    fn new(batch: &'a DocumentBatch, embeddings: Vec<Vec<f32>>) -> Self {
        Self {
            ids: &batch.ids,
            embeddings,
            documents: &batch.documents,
            metadatas: &batch.metadatas,
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: [Vec<f32>; 1],
    n_results: usize,
    include: [&'static str; 3],
}

impl QueryRequest {
    fn new(embedding: Vec<f32>, n_results: usize) -> Self {
        Self {
            query_embeddings: [embedding],
            n_results,
            include: ["documents", "metadatas", "distances"],
        }
    }
}

/// Column-major query result: one inner list per query text.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

pub struct ChromaVectorStore {
    client: reqwest::Client,
    base_url: String,
    embedder: Arc<dyn Embedder>,
    collection_ids: RwLock<HashMap<String, String>>,
}

impl ChromaVectorStore {
    /// Connect to a Chroma server, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            embedder,
            collection_ids: RwLock::new(HashMap::new()),
        }
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| MinerError::Storage(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MinerError::storage(format!(
                "Chroma returned {} for {}: {}",
                status, path, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MinerError::Storage(Box::new(e)))
    }

    async fn collection_id(&self, name: &str) -> Result<String> {
        let cached = self.collection_ids.read().unwrap().get(name).cloned();
        if let Some(id) = cached {
            return Ok(id);
        }

        let collection: CollectionResponse = self
            .post(
                "/api/v1/collections",
                &CreateCollectionRequest {
                    name,
                    get_or_create: true,
                },
            )
            .await?;
        debug!(collection = name, id = %collection.id, "Resolved Chroma collection");

        self.collection_ids
            .write()
            .unwrap()
            .insert(name.to_string(), collection.id.clone());
        Ok(collection.id)
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    async fn add(&self, collection: &str, batch: DocumentBatch) -> Result<()> {
        batch.validate()?;
        if batch.is_empty() {
            return Ok(());
        }

        let documents: Vec<&str> = batch.documents.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&documents).await?;
        check_batch(documents.len(), &embeddings)?;

        let id = self.collection_id(collection).await?;
        let _: Value = self
            .post(
                &format!("/api/v1/collections/{}/upsert", id),
                &UpsertRequest::new(&batch, embeddings),
            )
            .await?;
        debug!(collection, documents = batch.len(), "Upserted documents into Chroma");
        Ok(())
    }

    async fn query(&self, collection: &str, text: &str, k: usize) -> Result<Vec<VectorHit>> {
        let embedding = self.embedder.embed(text).await?;
        let id = self.collection_id(collection).await?;
        let response: QueryResponse = self
            .post(
                &format!("/api/v1/collections/{}/query", id),
                &QueryRequest::new(embedding, k),
            )
            .await?;

        Ok(hits_from_response(response))
    }
}

fn first_row<T>(rows: Option<Vec<Vec<Option<T>>>>) -> Vec<Option<T>> {
    rows.and_then(|r| r.into_iter().next()).unwrap_or_default()
}

fn hits_from_response(response: QueryResponse) -> Vec<VectorHit> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let documents = first_row(response.documents);
    let metadatas = first_row(response.metadatas);
    let distances = first_row(response.distances);

    ids.into_iter()
        .enumerate()
        .map(|(i, id)| VectorHit {
            id,
            content: documents.get(i).cloned().flatten().unwrap_or_default(),
            metadata: metadatas.get(i).cloned().flatten().unwrap_or_default(),
            distance: distances.get(i).copied().flatten(),
        })
        .collect()
}
