//! Job queue and worker pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which job store implementation backs the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// In-process store; jobs do not survive a restart.
    Memory,
    /// PostgreSQL-backed durable store.
    Postgres,
}

/// Job queue and worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Store backend.
    #[serde(default = "default_backend")]
    pub backend: QueueBackend,
    /// Identifier this worker process records on claimed jobs.
    #[serde(default = "default_worker_id")]
    pub worker_id: String,
    /// Interval in milliseconds between polls when a job type has no ready work.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Active jobs older than this are considered stalled and handed out again.
    #[serde(default = "default_stalled_after")]
    pub stalled_after_seconds: u64,
    /// Cron expression (with seconds) for the stalled-job sweep.
    #[serde(default = "default_maintenance_cron")]
    pub maintenance_cron: String,
    /// Default number of finished jobs kept per job type.
    #[serde(default = "default_completed_retention")]
    pub completed_retention: usize,
    /// How long shutdown waits for in-flight jobs, in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl QueueConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Stall threshold as a [`Duration`].
    pub fn stalled_after(&self) -> Duration {
        Duration::from_secs(self.stalled_after_seconds)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            worker_id: default_worker_id(),
            poll_interval_ms: default_poll_interval(),
            stalled_after_seconds: default_stalled_after(),
            maintenance_cron: default_maintenance_cron(),
            completed_retention: default_completed_retention(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

fn default_backend() -> QueueBackend {
    QueueBackend::Memory
}

fn default_worker_id() -> String {
    "quire-worker".to_string()
}

fn default_poll_interval() -> u64 {
    500
}

fn default_stalled_after() -> u64 {
    300
}

fn default_maintenance_cron() -> String {
    "0 * * * * *".to_string()
}

fn default_completed_retention() -> usize {
    1000
}

fn default_shutdown_grace() -> u64 {
    30
}
