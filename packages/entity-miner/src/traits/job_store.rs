//! Job lifecycle records for asynchronous mining requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One row of the job table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub user_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub input_type: String,
    pub error_message: Option<String>,
}

impl JobRecord {
    /// A freshly dispatched job.
    pub fn running(user_id: impl Into<String>, input_type: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            user_id: user_id.into(),
            status: JobStatus::Running,
            created_at: Utc::now(),
            updated_at: None,
            input_type: input_type.into(),
            error_message: None,
        }
    }

    /// Move to a terminal status.
    pub fn finish(mut self, status: JobStatus, error_message: Option<String>) -> Self {
        self.status = status;
        self.error_message = error_message;
        self.updated_at = Some(Utc::now());
        self
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or replace a record.
    async fn put(&self, record: &JobRecord) -> Result<()>;

    async fn get(&self, job_id: Uuid) -> Result<Option<JobRecord>>;
}
