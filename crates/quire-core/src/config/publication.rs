//! Publication pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the `publish-article` job type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationConfig {
    /// Grace period in milliseconds before a publish request is processed,
    /// leaving the author a window for one more edit.
    #[serde(default = "default_delay")]
    pub delay_ms: u64,
    /// Maximum number of publications processed at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Upper bound for any single pipeline step, in seconds.
    #[serde(default = "default_step_timeout")]
    pub step_timeout_seconds: u64,
    /// Search index receiving published articles.
    #[serde(default = "default_search_index")]
    pub search_index: String,
    /// Email of the platform account made editor of newly created tags.
    #[serde(default)]
    pub default_tag_editor_email: Option<String>,
}

impl PublicationConfig {
    /// Default publish delay as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Per-step timeout as a [`Duration`].
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_seconds)
    }
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay(),
            concurrency: default_concurrency(),
            step_timeout_seconds: default_step_timeout(),
            search_index: default_search_index(),
            default_tag_editor_email: None,
        }
    }
}

fn default_delay() -> u64 {
    2 * 60 * 1000
}

fn default_concurrency() -> usize {
    25
}

fn default_step_timeout() -> u64 {
    30
}

fn default_search_index() -> String {
    "article".to_string()
}
