//! Job executor: dispatches jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use quire_core::error::AppError;
use quire_entity::job::{Job, JobType};

use crate::context::JobContext;

/// Trait for job handler implementations.
///
/// The executor deserializes the stored payload into `Payload` before
/// calling [`execute`](JobHandler::execute) and serializes `Output` as the
/// job result.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug + 'static {
    /// Payload type carried by jobs of this type.
    type Payload: DeserializeOwned + Send;
    /// Result type stored on completion.
    type Output: Serialize + Send;

    /// The job type this handler processes.
    fn job_type(&self) -> JobType;

    /// Execute one job.
    async fn execute(
        &self,
        payload: Self::Payload,
        ctx: &JobContext,
    ) -> Result<Self::Output, JobExecutionError>;
}

/// Error from job execution. Every variant fails the job.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// The handler gave up.
    #[error("Job failed: {0}")]
    Failed(String),

    /// A collaborator call inside a named step failed.
    #[error("Step '{step}' failed: {source}")]
    Step {
        /// Step name.
        step: &'static str,
        /// Underlying error.
        #[source]
        source: AppError,
    },

    /// A collaborator call did not finish within the step deadline.
    #[error("Step '{step}' timed out after {after:?}")]
    Timeout {
        /// Step name.
        step: &'static str,
        /// Deadline that elapsed.
        after: Duration,
    },

    /// The stored payload does not match the handler's payload type.
    #[error("Invalid job payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    /// The handler panicked.
    #[error("Job handler panicked: {0}")]
    Panicked(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Wrap an error raised inside `step`.
    pub fn step(step: &'static str) -> impl FnOnce(AppError) -> Self {
        move |source| Self::Step { step, source }
    }
}

/// Type-erased handler stored in the registry.
#[async_trait]
trait ErasedHandler: Send + Sync + std::fmt::Debug {
    async fn run(&self, payload: Value, ctx: &JobContext) -> Result<Value, JobExecutionError>;
}

#[async_trait]
impl<H: JobHandler> ErasedHandler for H {
    async fn run(&self, payload: Value, ctx: &JobContext) -> Result<Value, JobExecutionError> {
        let payload: H::Payload =
            serde_json::from_value(payload).map_err(JobExecutionError::InvalidPayload)?;
        let output = self.execute(payload, ctx).await?;
        serde_json::to_value(output).map_err(|e| JobExecutionError::Internal(e.into()))
    }
}

#[derive(Debug, Clone)]
struct Registration {
    handler: Arc<dyn ErasedHandler>,
    concurrency: usize,
}

/// Dispatches jobs to the appropriate handler based on their job type.
#[derive(Debug, Default)]
pub struct JobExecutor {
    /// Registered job handlers by type
    handlers: HashMap<JobType, Registration>,
}

impl JobExecutor {
    /// Create a new job executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler that may run up to `concurrency` jobs at once.
    ///
    /// Registering a second handler for the same type replaces the first.
    pub fn register<H: JobHandler>(&mut self, handler: H, concurrency: usize) {
        let job_type = handler.job_type();
        let concurrency = concurrency.max(1);
        info!(%job_type, concurrency, "Registered job handler");
        self.handlers.insert(
            job_type,
            Registration {
                handler: Arc::new(handler),
                concurrency,
            },
        );
    }

    /// Registered job types with their concurrency, in a stable order.
    pub fn registrations(&self) -> Vec<(JobType, usize)> {
        JobType::ALL
            .iter()
            .filter_map(|t| self.handlers.get(t).map(|r| (*t, r.concurrency)))
            .collect()
    }

    /// Check if a handler is registered for a job type
    pub fn has_handler(&self, job_type: JobType) -> bool {
        self.handlers.contains_key(&job_type)
    }

    /// Execute a job by dispatching to its handler.
    pub async fn execute(&self, job: &Job, ctx: &JobContext) -> Result<Value, JobExecutionError> {
        let registration = job
            .kind()
            .and_then(|kind| self.handlers.get(&kind))
            .ok_or_else(|| {
                JobExecutionError::Failed(format!(
                    "No handler registered for job type '{}'",
                    job.job_type
                ))
            })?;

        info!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempt = job.attempts,
            "Executing job"
        );

        registration.handler.run(job.payload.clone(), ctx).await
    }
}
