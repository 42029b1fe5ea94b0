//! Story upload and download.

use axum::{
    extract::{Extension, Query},
    Json,
};
use chrono::Utc;
use entity_miner::{handler::prepare_upload, traits::blob_store::metadata_keys, MiningEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::server::{app::AppState, error::ApiError, jobs};

#[derive(Debug, Deserialize)]
pub struct StoryQuery {
    pub bucket: String,
    pub object_key: String,
}

#[derive(Debug, Serialize)]
pub struct StoryContent {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct StoryUploadRequest {
    pub text: String,
    pub filepath: String,
    pub bucket_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoryUploaded {
    pub message: String,
    pub path: String,
    /// Mining job started for the upload, when its owner is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
}

pub async fn get_story_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<StoryQuery>,
) -> Result<Json<StoryContent>, ApiError> {
    let object = state
        .deps
        .blobs
        .get_object(&query.bucket, &query.object_key)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Object '{}' not found in bucket '{}'",
                query.object_key, query.bucket
            ))
        })?;

    let content = object
        .text()
        .map_err(|e| ApiError::BadRequest(format!("story is not UTF-8: {}", e)))?
        .to_string();
    Ok(Json(StoryContent { content }))
}

/// Store a story and notify the miner, as a bucket notification would.
pub async fn upload_story_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<StoryUploadRequest>,
) -> Result<Json<StoryUploaded>, ApiError> {
    let blobs = &state.deps.blobs;
    let previous = blobs
        .get_object(&request.bucket_name, &request.filepath)
        .await?;
    let object = prepare_upload(
        &request.text,
        request.username.as_deref(),
        previous.as_ref(),
        Utc::now(),
    );
    let owner = object
        .metadata(metadata_keys::USERNAME)
        .map(str::to_string);

    blobs
        .put_object(&request.bucket_name, &request.filepath, object)
        .await?;
    tracing::info!(
        bucket = %request.bucket_name,
        path = %request.filepath,
        bytes = request.text.len(),
        "Story uploaded"
    );

    let job_id = match owner {
        Some(user_id) => {
            let event = MiningEvent::blob(&request.bucket_name, &request.filepath);
            Some(jobs::dispatch(&state, &user_id, event).await?.job_id)
        }
        None => None,
    };

    Ok(Json(StoryUploaded {
        message: "Story uploaded successfully".to_string(),
        path: request.filepath,
        job_id,
    }))
}
