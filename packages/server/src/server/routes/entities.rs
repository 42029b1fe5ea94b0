//! Vector store access: similarity search and manual entries.

use axum::{
    extract::{Extension, Query},
    Json,
};
use chrono::Utc;
use entity_miner::{DocumentBatch, Metadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::server::{app::AppState, error::ApiError};

fn default_n_results() -> usize {
    3
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub query_text: String,
    pub collection: String,
    #[serde(default = "default_n_results")]
    pub n_results: usize,
}

#[derive(Debug, Serialize)]
pub struct SimilarEntity {
    pub content: String,
    pub metadata: Metadata,
    pub distance: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct SimilarEntities {
    pub entities: Vec<SimilarEntity>,
}

#[derive(Debug, Deserialize)]
pub struct EntityAddRequest {
    pub collection: String,
    pub entity: String,
    pub description: String,
    pub key_relations: String,
    pub history: String,
}

#[derive(Debug, Serialize)]
pub struct EntityAdded {
    pub message: String,
    pub id: String,
}

pub async fn similar_entities_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<SimilarEntities>, ApiError> {
    let hits = state
        .deps
        .vectors
        .query(&query.collection, &query.query_text, query.n_results)
        .await?;

    Ok(Json(SimilarEntities {
        entities: hits
            .into_iter()
            .map(|hit| SimilarEntity {
                content: hit.content,
                metadata: hit.metadata,
                distance: hit.distance,
            })
            .collect(),
    }))
}

/// Add a hand-written entity document.
pub async fn add_entity_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<EntityAddRequest>,
) -> Result<Json<EntityAdded>, ApiError> {
    if request.entity.trim().is_empty() {
        return Err(ApiError::BadRequest("entity is required".into()));
    }

    let document = format!(
        "{}: {}\nRelations: {}\nHistory: {}",
        request.entity, request.description, request.key_relations, request.history
    );
    let id = format!("{}-{}", request.entity, Utc::now().timestamp());

    let mut metadata = Metadata::new();
    metadata.insert("source".into(), Value::from("manual_entry"));
    metadata.insert("entity".into(), Value::from(request.entity.as_str()));

    let mut batch = DocumentBatch::new();
    batch.push(id.clone(), document, metadata);
    state.deps.vectors.add(&request.collection, batch).await?;

    Ok(Json(EntityAdded {
        message: "Entity added successfully".to_string(),
        id,
    }))
}
