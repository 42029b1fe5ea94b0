//! Mining requests: asynchronous jobs and synchronous events.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use entity_miner::{
    handle_event, handler::DirectRequest, HandlerOutcome, JobRecord, JobStatus, MiningEvent,
};
use serde::Serialize;
use uuid::Uuid;

use crate::server::{app::AppState, error::ApiError, jobs};

#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub job_id: Uuid,
    pub status: JobStatus,
}

/// Start mining a text in the background.
///
/// Returns 202 with the job id; poll `/api/jobs/{job_id}` for the result.
pub async fn mine_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<DirectRequest>,
) -> Result<(StatusCode, Json<JobAccepted>), ApiError> {
    if request.text.trim().is_empty()
        || request.novel_name.trim().is_empty()
        || request.username.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "text, novel_name and username are required".into(),
        ));
    }

    let user_id = request.username.clone();
    let record = jobs::dispatch(&state, &user_id, MiningEvent::Direct(request)).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id: record.job_id,
            status: record.status,
        }),
    ))
}

pub async fn job_handler(
    Extension(state): Extension<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .deps
        .jobs
        .get(job_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("job {} not found", job_id)))
}

/// Run a mining event (blob notification or direct request) to completion.
pub async fn events_handler(
    Extension(state): Extension<AppState>,
    Json(event): Json<MiningEvent>,
) -> Json<HandlerOutcome> {
    Json(handle_event(&state.deps, &state.miner_config, event).await)
}
