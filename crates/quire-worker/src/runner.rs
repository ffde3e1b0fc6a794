//! Worker runner: main loop that polls the store and executes jobs.
//!
//! Each registered job type gets its own lane with its own concurrency
//! limit, so a burst of mail never starves publication (and the other way
//! round).

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::{Semaphore, watch};
use tokio::time;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use quire_core::config::QueueConfig;
use quire_core::result::AppResult;
use quire_entity::job::{Job, JobType};

use crate::context::JobContext;
use crate::executor::{JobExecutionError, JobExecutor};
use crate::store::JobStore;

/// Main worker runner that drains every registered job type.
#[derive(Debug, Clone)]
pub struct WorkerRunner {
    /// Job store for polling
    store: Arc<dyn JobStore>,
    /// Job executor for dispatching
    executor: Arc<JobExecutor>,
    /// Queue configuration
    config: QueueConfig,
}

impl WorkerRunner {
    /// Create a new worker runner
    pub fn new(store: Arc<dyn JobStore>, executor: Arc<JobExecutor>, config: QueueConfig) -> Self {
        Self {
            store,
            executor,
            config,
        }
    }

    /// Run until the cancel signal turns `true` (or its sender is dropped),
    /// then wait up to the configured grace period for in-flight jobs.
    pub async fn run(&self, cancel: watch::Receiver<bool>) {
        let registrations = self.executor.registrations();
        info!(
            worker_id = %self.config.worker_id,
            poll_interval_ms = self.config.poll_interval_ms,
            lanes = ?registrations,
            "Worker started"
        );

        let lanes = registrations.into_iter().map(|(job_type, concurrency)| {
            let lane = Lane {
                job_type,
                concurrency,
                runner: self.clone(),
            };
            tokio::spawn(lane.run(cancel.clone()))
        });

        for outcome in join_all(lanes).await {
            if let Err(e) = outcome {
                error!(error = %e, "Worker lane terminated abnormally");
            }
        }

        info!(worker_id = %self.config.worker_id, "Worker shut down complete");
    }

    /// Dequeue and process one ready job of `job_type` on the current task.
    ///
    /// Returns the processed job ID, or `None` if nothing was ready.
    pub async fn run_next(&self, job_type: JobType) -> AppResult<Option<Uuid>> {
        let Some(job) = self.store.dequeue(job_type, &self.config.worker_id).await? else {
            return Ok(None);
        };
        let job_id = job.id;
        self.process(job).await;
        Ok(Some(job_id))
    }

    /// Execute a dispatched job and record its outcome.
    ///
    /// A panicking handler fails only its own job.
    async fn process(&self, job: Job) {
        let job_id = job.id;
        let job_type = job.job_type.clone();
        let started = Instant::now();
        let ctx = JobContext::new(job.clone(), Arc::clone(&self.store));

        let outcome = AssertUnwindSafe(self.executor.execute(&job, &ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(JobExecutionError::Panicked(panic_message(&*panic))));
        let elapsed_ms = started.elapsed().as_millis();

        match outcome {
            Ok(result) => {
                info!(%job_id, %job_type, elapsed_ms, "Job completed");
                if let Err(e) = self.store.resolve(job_id, result).await {
                    error!(%job_id, error = %e, "Failed to mark job as completed");
                }
            }
            Err(err) => {
                let message = err.to_string();
                warn!(%job_id, %job_type, elapsed_ms, error = %message, "Job failed");
                if let Err(e) = self.store.fail(job_id, &message).await {
                    error!(%job_id, error = %e, "Failed to mark job as failed");
                }
            }
        }
    }
}

/// Polling loop for one job type.
struct Lane {
    job_type: JobType,
    concurrency: usize,
    runner: WorkerRunner,
}

impl Lane {
    async fn run(self, mut cancel: watch::Receiver<bool>) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let worker_id = self.runner.config.worker_id.clone();
        let poll_interval = self.runner.config.poll_interval();

        loop {
            let permit = tokio::select! {
                _ = shutdown_requested(&mut cancel) => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            match self.runner.store.dequeue(self.job_type, &worker_id).await {
                Ok(Some(job)) => {
                    let runner = self.runner.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        runner.process(job).await;
                    });
                }
                Ok(None) => {
                    drop(permit);
                    trace!(job_type = %self.job_type, "No jobs ready");
                    if idle(&mut cancel, poll_interval).await {
                        break;
                    }
                }
                Err(e) => {
                    drop(permit);
                    error!(job_type = %self.job_type, error = %e, "Failed to dequeue job");
                    if idle(&mut cancel, poll_interval).await {
                        break;
                    }
                }
            }
        }

        debug!(job_type = %self.job_type, "Waiting for in-flight jobs to complete");
        let permits = u32::try_from(self.concurrency).unwrap_or(u32::MAX);
        let grace = self.runner.config.shutdown_grace();
        if time::timeout(grace, semaphore.acquire_many(permits)).await.is_err() {
            warn!(
                job_type = %self.job_type,
                grace_seconds = grace.as_secs(),
                "In-flight jobs still running after grace period; they may be recovered as stalled"
            );
        }
    }
}

/// Resolve once the cancel flag is `true` or its sender is gone.
async fn shutdown_requested(cancel: &mut watch::Receiver<bool>) {
    loop {
        let stop = *cancel.borrow_and_update();
        if stop || cancel.changed().await.is_err() {
            return;
        }
    }
}

/// Sleep for one poll interval. Returns `true` if shutdown was requested.
async fn idle(cancel: &mut watch::Receiver<bool>, poll_interval: Duration) -> bool {
    tokio::select! {
        _ = shutdown_requested(cancel) => true,
        _ = time::sleep(poll_interval) => false,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
