//! Asynchronous mining jobs.
//!
//! A job row is written as RUNNING before the work is spawned, and closed with
//! SUCCEEDED or FAILED from the handler's outcome once it finishes.

use entity_miner::{
    handle_event, HandlerOutcome, JobRecord, JobStatus, MinerConfig, MinerDeps, MiningEvent,
    OutcomeStatus, Result,
};

use crate::server::app::AppState;

/// Record a RUNNING job and run the event on a background task.
pub async fn dispatch(state: &AppState, user_id: &str, event: MiningEvent) -> Result<JobRecord> {
    let record = JobRecord::running(user_id, event.input_type());
    state.deps.jobs.put(&record).await?;

    tracing::info!(
        job_id = %record.job_id,
        user_id,
        input_type = record.input_type.as_str(),
        "Mining job dispatched"
    );

    let deps = state.deps.clone();
    let config = state.miner_config.clone();
    let job = record.clone();
    tokio::spawn(async move {
        run_job(&deps, &config, job, event).await;
    });

    Ok(record)
}

/// Run one job to completion and close its row.
pub async fn run_job(
    deps: &MinerDeps,
    config: &MinerConfig,
    record: JobRecord,
    event: MiningEvent,
) -> HandlerOutcome {
    let job_id = record.job_id;
    let outcome = handle_event(deps, config, event).await;

    let finished = match outcome.status {
        OutcomeStatus::Success | OutcomeStatus::NoChange => record.finish(JobStatus::Succeeded, None),
        OutcomeStatus::Failure => record.finish(JobStatus::Failed, outcome.error_message.clone()),
    };
    if let Err(e) = deps.jobs.put(&finished).await {
        tracing::error!(job_id = %job_id, error = %e, "Failed to close job record");
    }

    tracing::info!(
        job_id = %job_id,
        status = ?finished.status,
        num_mined_entities = outcome.num_mined_entities,
        "Mining job finished"
    );
    outcome
}
