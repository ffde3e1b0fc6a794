//! Cron scheduler for queue maintenance.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, error, info};

use quire_core::config::QueueConfig;
use quire_core::error::AppError;
use quire_core::result::AppResult;

use crate::store::JobStore;

/// Cron-based scheduler that periodically hands stalled jobs back to the queue.
pub struct MaintenanceScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Store to sweep
    store: Arc<dyn JobStore>,
    /// Queue configuration (cron expression and stall threshold)
    config: QueueConfig,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler")
            .field("cron", &self.config.maintenance_cron)
            .finish()
    }
}

impl MaintenanceScheduler {
    /// Create a new scheduler and register the stalled-job sweep.
    pub async fn new(store: Arc<dyn JobStore>, config: QueueConfig) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        let this = Self {
            scheduler,
            store,
            config,
        };
        this.register_stalled_sweep().await?;
        Ok(this)
    }

    /// Start the scheduler
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Maintenance scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Maintenance scheduler shut down");
        Ok(())
    }

    async fn register_stalled_sweep(&self) -> AppResult<()> {
        let store = Arc::clone(&self.store);
        let threshold = self.config.stalled_after();
        let cron = self.config.maintenance_cron.as_str();

        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let store = Arc::clone(&store);
            Box::pin(async move {
                if let Err(e) = sweep_stalled(store.as_ref(), threshold).await {
                    error!(error = %e, "Stalled job sweep failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid maintenance cron '{cron}': {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add stalled sweep: {e}")))?;

        info!(cron, stalled_after_seconds = threshold.as_secs(), "Registered: stalled_sweep");
        Ok(())
    }
}

/// Return jobs active for longer than `threshold` to the waiting state.
pub async fn sweep_stalled(store: &dyn JobStore, threshold: Duration) -> AppResult<u64> {
    let recovered = store.recover_stalled(threshold).await?;
    if recovered > 0 {
        info!(recovered, "Recovered stalled jobs");
    }

    let stats = store.stats().await?;
    debug!(
        waiting = stats.waiting,
        delayed = stats.delayed,
        active = stats.active,
        completed = stats.completed,
        failed = stats.failed,
        "Queue stats"
    );
    Ok(recovered)
}
