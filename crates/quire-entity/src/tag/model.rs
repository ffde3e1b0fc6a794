//! Tag entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quire_core::types::{TagId, UserId};

/// A tag; `content` is unique across all tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Unique tag identifier.
    pub id: TagId,
    /// Tag text, the dedup key.
    pub content: String,
    /// Users allowed to curate the tag.
    pub editors: Vec<UserId>,
    /// User whose article first introduced the tag.
    pub creator: UserId,
    /// When the tag was created.
    pub created_at: DateTime<Utc>,
}

/// Data for create-or-fetch of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTag {
    /// Tag text.
    pub content: String,
    /// Editors assigned only when the tag is newly created.
    pub editors: Vec<UserId>,
    /// Creator assigned only when the tag is newly created.
    pub creator: UserId,
}
