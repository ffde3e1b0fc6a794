//! Draft publication state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Publication state of a draft. Only the publication pipeline writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    /// Waiting for the pipeline to pick it up.
    Pending,
    /// Claimed by a pipeline run; no other dispatch may proceed.
    InProgress,
    /// Article created, draft archived.
    Published,
    /// Publishing failed before the point of no return.
    Error,
}

impl PublishState {
    /// Return the state as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Published => "published",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
