//! Typed job payload definitions.

use serde::{Deserialize, Serialize};

use quire_core::types::DraftId;

/// Payload of a `publish-article` job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishArticlePayload {
    /// Draft to publish.
    pub draft_id: DraftId,
}
