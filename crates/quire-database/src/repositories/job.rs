//! Job queue repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use quire_core::error::{AppError, ErrorKind};
use quire_core::result::AppResult;
use quire_entity::job::model::Job;
use quire_entity::job::status::JobStatus;

/// Number of jobs in one status.
#[derive(Debug, Clone, FromRow)]
pub struct StatusCount {
    /// Job status.
    pub status: JobStatus,
    /// Jobs in that status.
    pub count: i64,
}

/// Repository for the `jobs` table and its queue operations.
///
/// Every state-changing statement is guarded by the status it expects, so a
/// caller racing another worker observes `false` / `None` instead of
/// clobbering a transition it did not own.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a job by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    /// Insert a job row built by the caller.
    pub async fn insert(&self, job: &Job) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (id, job_type, priority, payload, status, progress, attempts, \
             delay_ms, retain, enqueued_at, run_at) \
             VALUES ($1, $2, $3, $4, $5, 0, 0, $6, $7, $8, $9) RETURNING *",
        )
        .bind(job.id)
        .bind(&job.job_type)
        .bind(job.priority)
        .bind(&job.payload)
        .bind(job.status)
        .bind(job.delay_ms)
        .bind(job.retain)
        .bind(job.enqueued_at)
        .bind(job.run_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert job", e))
    }

    /// Claim the next ready job of a type (SKIP LOCKED for concurrency).
    ///
    /// Ready means waiting or delayed with `run_at` in the past; the highest
    /// priority wins, then the earliest eligible time, then enqueue order.
    pub async fn claim_next(&self, job_type: &str, worker_id: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'active', started_at = NOW(), worker_id = $2, \
             attempts = attempts + 1 \
             WHERE id = ( \
                SELECT id FROM jobs \
                WHERE job_type = $1 AND status IN ('waiting', 'delayed') AND run_at <= NOW() \
                ORDER BY priority DESC, run_at ASC, enqueued_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(job_type)
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim job", e))
    }

    /// Raise the progress of an active job. Returns `false` if the job is not active.
    pub async fn update_progress(&self, job_id: Uuid, progress: i16) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET progress = GREATEST(progress, $2) WHERE id = $1 AND status = 'active'",
        )
        .bind(job_id)
        .bind(progress)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update progress", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Mark an active job as completed. Returns `None` if the job was not active.
    pub async fn mark_completed(
        &self,
        job_id: Uuid,
        result: &serde_json::Value,
    ) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'completed', result = $2, progress = 100, \
             finished_at = NOW() WHERE id = $1 AND status = 'active' RETURNING *",
        )
        .bind(job_id)
        .bind(result)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))
    }

    /// Mark an active job as failed. Returns `None` if the job was not active.
    pub async fn mark_failed(&self, job_id: Uuid, error_message: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'failed', error_message = $2, finished_at = NOW() \
             WHERE id = $1 AND status = 'active' RETURNING *",
        )
        .bind(job_id)
        .bind(error_message)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark job as failed", e)
        })
    }

    /// Delete a job that has not been dispatched yet.
    pub async fn withdraw(&self, job_id: Uuid) -> AppResult<bool> {
        let outcome = sqlx::query(
            "DELETE FROM jobs WHERE id = $1 AND status IN ('waiting', 'delayed')",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to withdraw job", e))?;
        Ok(outcome.rows_affected() == 1)
    }

    /// Hand active jobs started before `before` back to the waiting state.
    pub async fn requeue_stalled(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let outcome = sqlx::query(
            "UPDATE jobs SET status = 'waiting', worker_id = NULL, run_at = NOW() \
             WHERE status = 'active' AND started_at <= $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to requeue stalled jobs", e)
        })?;
        Ok(outcome.rows_affected())
    }

    /// Delete finished jobs of a type beyond the `keep` most recent.
    pub async fn prune_finished(&self, job_type: &str, keep: i64) -> AppResult<u64> {
        let outcome = sqlx::query(
            "DELETE FROM jobs WHERE id IN ( \
                SELECT id FROM jobs \
                WHERE job_type = $1 AND status IN ('completed', 'failed') \
                ORDER BY finished_at DESC \
                OFFSET $2 \
             )",
        )
        .bind(job_type)
        .bind(keep)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to prune finished jobs", e)
        })?;
        Ok(outcome.rows_affected())
    }

    /// Count jobs per status.
    pub async fn count_by_status(&self) -> AppResult<Vec<StatusCount>> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM jobs GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))
    }
}
