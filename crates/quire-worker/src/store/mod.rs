//! Job store abstraction: a prioritized, delayable queue with progress
//! reporting and bounded retention of finished jobs.
//!
//! Delivery is at-least-once. A job whose worker disappears stays `active`
//! until [`JobStore::recover_stalled`] hands it out again, so handlers must
//! tolerate re-execution.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quire_core::result::AppResult;
use quire_entity::job::{CreateJob, Job, JobStatus, JobType};

pub use memory::MemoryJobStore;
pub use postgres::PgJobStore;

/// Trait for job queue backends.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Add a job. It becomes visible to workers once its delay elapses.
    async fn enqueue(&self, job: CreateJob) -> AppResult<Job>;

    /// Claim the next ready job of `job_type`: highest priority first, then
    /// earliest eligible time. The job becomes `active`.
    async fn dequeue(&self, job_type: JobType, worker_id: &str) -> AppResult<Option<Job>>;

    /// Record progress of an active job. Progress never decreases; a value
    /// at or below the current one is ignored. Fails with a conflict error
    /// if the job is not active.
    async fn report_progress(&self, job_id: Uuid, percent: u8) -> AppResult<()>;

    /// Complete an active job with its result.
    async fn resolve(&self, job_id: Uuid, result: serde_json::Value) -> AppResult<()>;

    /// Fail an active job.
    async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<()>;

    /// Remove a waiting or delayed job. Returns `false` if it was already
    /// dispatched, finished, or evicted.
    async fn withdraw(&self, job_id: Uuid) -> AppResult<bool>;

    /// Look a job up while it is still retained.
    async fn find(&self, job_id: Uuid) -> AppResult<Option<Job>>;

    /// Return active jobs dispatched longer than `older_than` ago to the
    /// waiting state. Returns how many were recovered.
    async fn recover_stalled(&self, older_than: Duration) -> AppResult<u64>;

    /// Count jobs per status.
    async fn stats(&self) -> AppResult<QueueStats>;
}

/// Queue statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs ready to run.
    pub waiting: u64,
    /// Jobs whose delay has not been dispatched yet.
    pub delayed: u64,
    /// Jobs being processed.
    pub active: u64,
    /// Retained completed jobs.
    pub completed: u64,
    /// Retained failed jobs.
    pub failed: u64,
}

impl QueueStats {
    /// Add `count` jobs of `status`.
    pub fn record(&mut self, status: JobStatus, count: u64) {
        match status {
            JobStatus::Waiting => self.waiting += count,
            JobStatus::Delayed => self.delayed += count,
            JobStatus::Active => self.active += count,
            JobStatus::Completed => self.completed += count,
            JobStatus::Failed => self.failed += count,
        }
    }
}
