//! Per-job execution context handed to handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::warn;
use uuid::Uuid;

use quire_entity::job::Job;

use crate::store::JobStore;

/// Execution context for one dispatch of a job.
#[derive(Debug)]
pub struct JobContext {
    job: Job,
    store: Arc<dyn JobStore>,
    progress: AtomicU8,
}

impl JobContext {
    /// Create a context for a job that was just dequeued.
    pub fn new(job: Job, store: Arc<dyn JobStore>) -> Self {
        let progress = u8::try_from(job.progress.clamp(0, 100)).unwrap_or(0);
        Self {
            job,
            store,
            progress: AtomicU8::new(progress),
        }
    }

    /// The job being executed.
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Job ID.
    pub fn job_id(&self) -> Uuid {
        self.job.id
    }

    /// Dispatch attempt, starting at 1.
    pub fn attempt(&self) -> i32 {
        self.job.attempts
    }

    /// Last progress reported through this context.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Acquire)
    }

    /// Report progress to the store.
    ///
    /// Values above 100 are clamped and values at or below the last report
    /// are dropped. A store failure is logged and never fails the job.
    pub async fn report_progress(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.progress.fetch_max(percent, Ordering::AcqRel);
        if percent <= previous {
            return;
        }

        if let Err(e) = self.store.report_progress(self.job.id, percent).await {
            warn!(job_id = %self.job.id, percent, error = %e, "Failed to report job progress");
        }
    }
}
