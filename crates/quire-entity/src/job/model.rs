//! Job entity model.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::JobType;
use super::options::JobOptions;
use super::status::{JobPriority, JobStatus};

/// A background job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Job type identifier (e.g., `"publish-article"`).
    pub job_type: String,
    /// Job priority.
    pub priority: JobPriority,
    /// Job-specific payload (JSON).
    pub payload: serde_json::Value,
    /// Current job status.
    pub status: JobStatus,
    /// Progress percentage reported by the handler, 0 to 100.
    pub progress: i16,
    /// Number of times the job has been dispatched.
    pub attempts: i32,
    /// Requested activation delay in milliseconds.
    pub delay_ms: i64,
    /// Finished jobs of this type kept once this one finishes.
    pub retain: i32,
    /// Result data on completion (JSON).
    pub result: Option<serde_json::Value>,
    /// Error message on failure.
    pub error_message: Option<String>,
    /// Worker ID that picked up the job.
    pub worker_id: Option<String>,
    /// When the job was enqueued.
    pub enqueued_at: DateTime<Utc>,
    /// Earliest time the job may be dispatched.
    pub run_at: DateTime<Utc>,
    /// When the job was last dispatched.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Build a fresh job row from a create request.
    pub fn from_create(data: &CreateJob, retain: usize, now: DateTime<Utc>) -> Self {
        let delay = chrono::Duration::from_std(data.options.delay).unwrap_or(chrono::Duration::MAX);
        let status = if data.options.delay.is_zero() {
            JobStatus::Waiting
        } else {
            JobStatus::Delayed
        };

        Self {
            id: Uuid::new_v4(),
            job_type: data.job_type.as_str().to_string(),
            priority: data.options.priority,
            payload: data.payload.clone(),
            status,
            progress: 0,
            attempts: 0,
            delay_ms: i64::try_from(data.options.delay.as_millis()).unwrap_or(i64::MAX),
            retain: i32::try_from(retain).unwrap_or(i32::MAX),
            result: None,
            error_message: None,
            worker_id: None,
            enqueued_at: now,
            run_at: now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC),
            started_at: None,
            finished_at: None,
        }
    }

    /// Parse the job type tag.
    pub fn kind(&self) -> Option<JobType> {
        self.job_type.parse().ok()
    }

    /// Check whether the job may be dispatched at `now`.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, JobStatus::Waiting | JobStatus::Delayed) && self.run_at <= now
    }

    /// How long the job has been active, if it is.
    pub fn active_for(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.status != JobStatus::Active {
            return None;
        }
        self.started_at
            .and_then(|started| (now - started).to_std().ok())
    }
}

/// Data required to create a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Job type tag.
    pub job_type: JobType,
    /// Job-specific payload.
    pub payload: serde_json::Value,
    /// Priority, delay and retention.
    pub options: JobOptions,
}

impl CreateJob {
    /// Serialize a typed payload into a create request.
    pub fn new<P: Serialize>(
        job_type: JobType,
        payload: &P,
        options: JobOptions,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            job_type,
            payload: serde_json::to_value(payload)?,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(delay: Duration) -> CreateJob {
        CreateJob {
            job_type: JobType::SendMail,
            payload: serde_json::json!({"to": ["a@example.com"]}),
            options: JobOptions::new(JobPriority::Normal).with_delay(delay),
        }
    }

    #[test]
    fn test_undelayed_job_is_waiting_and_ready() {
        let now = Utc::now();
        let job = Job::from_create(&create(Duration::ZERO), 100, now);
        assert_eq!(job.status, JobStatus::Waiting);
        assert!(job.is_ready(now));
        assert_eq!(job.kind(), Some(JobType::SendMail));
    }

    #[test]
    fn test_delayed_job_becomes_ready_after_delay() {
        let now = Utc::now();
        let job = Job::from_create(&create(Duration::from_secs(60)), 100, now);
        assert_eq!(job.status, JobStatus::Delayed);
        assert_eq!(job.delay_ms, 60_000);
        assert!(!job.is_ready(now));
        assert!(job.is_ready(now + chrono::Duration::seconds(61)));
    }
}
