//! Mail and push delivery queue configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the `send-mail` and `push-notification` job types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationQueueConfig {
    /// Concurrent deliveries per job type.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Finished delivery jobs kept per job type.
    #[serde(default = "default_completed_retention")]
    pub completed_retention: usize,
    /// Upper bound for one provider call, in seconds.
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_seconds: u64,
}

impl NotificationQueueConfig {
    /// Delivery timeout as a [`Duration`].
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_seconds)
    }
}

impl Default for NotificationQueueConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            completed_retention: default_completed_retention(),
            delivery_timeout_seconds: default_delivery_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}

fn default_completed_retention() -> usize {
    100
}

fn default_delivery_timeout() -> u64 {
    30
}
