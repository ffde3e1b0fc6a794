//! Enqueue options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::status::JobPriority;

/// How many finished jobs of a type the store keeps once this job finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Use the store-wide default.
    Default,
    /// Keep at most this many finished jobs of the same type.
    KeepLast(usize),
}

impl Retention {
    /// Resolve against the store default.
    pub fn resolve(&self, default: usize) -> usize {
        match self {
            Self::Default => default,
            Self::KeepLast(n) => (*n).max(1),
        }
    }
}

/// Options accepted by `enqueue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Priority band.
    pub priority: JobPriority,
    /// Delay before the job becomes visible to workers.
    pub delay: Duration,
    /// Finished-list retention.
    pub retention: Retention,
}

impl JobOptions {
    /// Options with the given priority, no delay and default retention.
    pub fn new(priority: JobPriority) -> Self {
        Self {
            priority,
            delay: Duration::ZERO,
            retention: Retention::Default,
        }
    }

    /// Set the activation delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Keep at most `n` finished jobs of this type.
    pub fn keep_last(mut self, n: usize) -> Self {
        self.retention = Retention::KeepLast(n);
        self
    }
}

impl Default for JobOptions {
    fn default() -> Self {
        Self::new(JobPriority::Normal)
    }
}
