//! Mining requests and their structured outcome.
//!
//! Two request shapes are accepted: a blob-store notification naming an
//! uploaded story, or a direct request carrying the text. Whatever happens,
//! the caller gets a [`HandlerOutcome`] back rather than an error.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::upload::{mark_mined, should_mine};
use crate::deps::MinerDeps;
use crate::error::{MinerError, Result};
use crate::pipeline::{collection_name, EntityMiningWorkflow};
use crate::traits::blob_store::metadata_keys;
use crate::types::config::MinerConfig;

/// Event source value of blob-store notifications.
pub const BLOB_EVENT_SOURCE: &str = "aws:s3";

/// A mining request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MiningEvent {
    BlobNotification(BlobNotification),
    Direct(DirectRequest),
}

/// Text submitted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectRequest {
    pub text: String,
    pub novel_name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobNotification {
    #[serde(rename = "Records")]
    pub records: Vec<BlobRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    #[serde(rename = "eventSource")]
    pub event_source: String,
    pub s3: BlobEntity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}

impl MiningEvent {
    /// A direct request.
    pub fn direct(
        text: impl Into<String>,
        novel_name: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self::Direct(DirectRequest {
            text: text.into(),
            novel_name: novel_name.into(),
            username: username.into(),
        })
    }

    /// A single-record blob notification.
    pub fn blob(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::BlobNotification(BlobNotification {
            records: vec![BlobRecord {
                event_source: BLOB_EVENT_SOURCE.to_string(),
                s3: BlobEntity {
                    bucket: BucketRef { name: bucket.into() },
                    object: ObjectRef { key: key.into() },
                },
            }],
        })
    }

    /// Short name for logs and job records.
    pub fn input_type(&self) -> &'static str {
        match self {
            Self::BlobNotification(_) => "blob",
            Self::Direct(_) => "text",
        }
    }
}

/// Novel name of an object key: the file stem of its last path segment.
///
/// `alice/stories/nadarr_prologue.txt` is `nadarr_prologue`.
pub fn novel_name_from_key(key: &str) -> &str {
    let file = key.rsplit('/').next().unwrap_or(key);
    file.split('.').next().unwrap_or(file)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failure,
    NoChange,
}

/// What the handler reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerOutcome {
    pub status: OutcomeStatus,
    pub num_mined_entities: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl HandlerOutcome {
    pub fn success(num_mined_entities: usize) -> Self {
        Self {
            status: OutcomeStatus::Success,
            num_mined_entities,
            error_type: None,
            error_message: None,
        }
    }

    pub fn no_change() -> Self {
        Self {
            status: OutcomeStatus::NoChange,
            num_mined_entities: 0,
            error_type: None,
            error_message: None,
        }
    }

    pub fn failure(error: &MinerError) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            num_mined_entities: 0,
            error_type: Some(error.kind().to_string()),
            error_message: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// The text to mine and where its profiles go.
struct MiningInput {
    text: String,
    novel_name: String,
    username: String,
    /// Set for blob events, so the mined hash can be recorded.
    source: Option<(String, String)>,
}

/// Handle one mining request end to end. Never fails.
pub async fn handle_event(deps: &MinerDeps, config: &MinerConfig, event: MiningEvent) -> HandlerOutcome {
    let input_type = event.input_type();
    match run(deps, config, event).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(input_type, error_type = e.kind(), error = %e, "Mining request failed");
            HandlerOutcome::failure(&e)
        }
    }
}

async fn run(deps: &MinerDeps, config: &MinerConfig, event: MiningEvent) -> Result<HandlerOutcome> {
    let input = match event {
        MiningEvent::Direct(request) => direct_input(request)?,
        MiningEvent::BlobNotification(notification) => {
            match blob_input(deps, config, notification).await? {
                Some(input) => input,
                None => return Ok(HandlerOutcome::no_change()),
            }
        }
    };

    let workflow = EntityMiningWorkflow::new(deps, config.clone()).await?;
    let mined = workflow.mine(&input.text).await?;
    let num_mined_entities = mined.profiled_entities.len();

    let collection = collection_name(&input.username, &input.novel_name);
    let saved = workflow
        .save(&collection, &mined.profiled_entities, &mined.genre, &input.novel_name)
        .await;
    if !saved {
        return Ok(HandlerOutcome {
            num_mined_entities,
            ..HandlerOutcome::failure(&MinerError::storage(format!(
                "failed to save profiles to collection {}",
                collection
            )))
        });
    }

    if let Some((bucket, key)) = &input.source {
        record_mined(deps, bucket, key, &input.text).await;
    }

    info!(
        collection = %collection,
        num_mined_entities,
        "Mining request complete"
    );
    Ok(HandlerOutcome::success(num_mined_entities))
}

fn direct_input(request: DirectRequest) -> Result<MiningInput> {
    for (field, value) in [
        ("text", &request.text),
        ("novel_name", &request.novel_name),
        ("username", &request.username),
    ] {
        if value.trim().is_empty() {
            return Err(MinerError::InvalidArgument(format!("{} cannot be empty", field)));
        }
    }

    Ok(MiningInput {
        text: request.text,
        novel_name: request.novel_name,
        username: request.username,
        source: None,
    })
}

/// Resolve a blob notification. `Ok(None)` when the guard says the upload
/// does not need mining.
async fn blob_input(
    deps: &MinerDeps,
    config: &MinerConfig,
    notification: BlobNotification,
) -> Result<Option<MiningInput>> {
    let record = notification
        .records
        .into_iter()
        .next()
        .ok_or_else(|| MinerError::InvalidArgument("notification has no records".into()))?;
    if record.event_source != BLOB_EVENT_SOURCE {
        return Err(MinerError::InvalidArgument(format!(
            "unsupported event source: {}",
            record.event_source
        )));
    }

    let bucket = record.s3.bucket.name;
    let key = record.s3.object.key;
    let object = deps
        .blobs
        .get_object(&bucket, &key)
        .await?
        .ok_or_else(|| {
            MinerError::InvalidArgument(format!("object '{}' not found in bucket '{}'", key, bucket))
        })?;

    if !should_mine(&object, chrono::Utc::now(), config.staleness_window()) {
        warn!(bucket = %bucket, key = %key, "Story unchanged since last mining, skipping");
        return Ok(None);
    }

    let username = object
        .metadata(metadata_keys::USERNAME)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            MinerError::InvalidArgument(format!("object '{}' has no username metadata", key))
        })?
        .to_string();
    let text = object
        .text()
        .map_err(|e| MinerError::InvalidArgument(format!("object '{}' is not UTF-8: {}", key, e)))?
        .to_string();

    Ok(Some(MiningInput {
        text,
        novel_name: novel_name_from_key(&key).to_string(),
        username,
        source: Some((bucket, key)),
    }))
}

/// Write the hash of the mined text back onto the object. Failures only cost
/// a redundant re-mine later.
async fn record_mined(deps: &MinerDeps, bucket: &str, key: &str, mined_text: &str) {
    let result = match deps.blobs.get_object(bucket, key).await {
        Ok(Some(object)) => {
            deps.blobs
                .put_object(bucket, key, mark_mined(object, mined_text))
                .await
        }
        Ok(None) => return,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(bucket, key, error = %e, "Failed to record mined hash");
    }
}
