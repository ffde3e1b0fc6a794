//! PostgreSQL-backed job store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use quire_core::error::AppError;
use quire_core::result::AppResult;
use quire_database::repositories::JobRepository;
use quire_entity::job::{CreateJob, Job, JobType};

use super::{JobStore, QueueStats};

/// Durable job store on top of the `jobs` table.
///
/// Claims use `FOR UPDATE SKIP LOCKED`, so several worker processes may
/// share one database.
#[derive(Debug, Clone)]
pub struct PgJobStore {
    /// Job repository for database persistence
    repo: Arc<JobRepository>,
    /// Finished jobs kept per type when a job does not say otherwise
    default_retention: usize,
}

impl PgJobStore {
    /// Create a new store.
    pub fn new(repo: Arc<JobRepository>, default_retention: usize) -> Self {
        Self {
            repo,
            default_retention: default_retention.max(1),
        }
    }

    async fn prune(&self, job: &Job) -> AppResult<()> {
        let keep = i64::from(job.retain.max(1));
        let pruned = self.repo.prune_finished(&job.job_type, keep).await?;
        if pruned > 0 {
            debug!(job_type = %job.job_type, pruned, "Pruned finished jobs");
        }
        Ok(())
    }

    /// Tell a missing job apart from one in the wrong state.
    async fn not_active(&self, job_id: Uuid) -> AppError {
        match self.repo.find_by_id(job_id).await {
            Ok(Some(job)) => AppError::conflict(format!("Job {job_id} is {}, not active", job.status)),
            Ok(None) => AppError::not_found(format!("Job {job_id} not found")),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn enqueue(&self, data: CreateJob) -> AppResult<Job> {
        let retain = data.options.retention.resolve(self.default_retention);
        let job = self
            .repo
            .insert(&Job::from_create(&data, retain, Utc::now()))
            .await?;

        debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            priority = %job.priority,
            delay_ms = job.delay_ms,
            "Enqueued job"
        );
        Ok(job)
    }

    async fn dequeue(&self, job_type: JobType, worker_id: &str) -> AppResult<Option<Job>> {
        let job = self.repo.claim_next(job_type.as_str(), worker_id).await?;
        if let Some(job) = &job {
            debug!(job_id = %job.id, job_type = %job.job_type, attempt = job.attempts, "Dequeued job");
        }
        Ok(job)
    }

    async fn report_progress(&self, job_id: Uuid, percent: u8) -> AppResult<()> {
        let progress = i16::from(percent.min(100));
        if self.repo.update_progress(job_id, progress).await? {
            Ok(())
        } else {
            Err(self.not_active(job_id).await)
        }
    }

    async fn resolve(&self, job_id: Uuid, result: serde_json::Value) -> AppResult<()> {
        let Some(job) = self.repo.mark_completed(job_id, &result).await? else {
            return Err(self.not_active(job_id).await);
        };
        debug!(%job_id, "Job completed");

        // Retention is housekeeping; the job itself is already resolved.
        if let Err(e) = self.prune(&job).await {
            warn!(%job_id, error = %e, "Failed to prune finished jobs");
        }
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        let Some(job) = self.repo.mark_failed(job_id, error).await? else {
            return Err(self.not_active(job_id).await);
        };
        debug!(%job_id, error, "Job failed");

        if let Err(e) = self.prune(&job).await {
            warn!(%job_id, error = %e, "Failed to prune finished jobs");
        }
        Ok(())
    }

    async fn withdraw(&self, job_id: Uuid) -> AppResult<bool> {
        let withdrawn = self.repo.withdraw(job_id).await?;
        if withdrawn {
            debug!(%job_id, "Job withdrawn");
        }
        Ok(withdrawn)
    }

    async fn find(&self, job_id: Uuid) -> AppResult<Option<Job>> {
        self.repo.find_by_id(job_id).await
    }

    async fn recover_stalled(&self, older_than: Duration) -> AppResult<u64> {
        let threshold = chrono::Duration::from_std(older_than)
            .map_err(|e| AppError::validation(format!("Invalid stall threshold: {e}")))?;
        self.repo.requeue_stalled(Utc::now() - threshold).await
    }

    async fn stats(&self) -> AppResult<QueueStats> {
        let mut stats = QueueStats::default();
        for row in self.repo.count_by_status().await? {
            stats.record(row.status, u64::try_from(row.count).unwrap_or(0));
        }
        Ok(stats)
    }
}
