//! Push message model.

use serde::{Deserialize, Serialize};

use quire_core::types::UserId;

/// One push notification to deliver to a set of users' devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    /// Users whose devices receive the push.
    pub recipients: Vec<UserId>,
    /// Title line.
    #[serde(default)]
    pub title: Option<String>,
    /// Body text.
    pub body: String,
    /// Deep link opened on tap.
    #[serde(default)]
    pub link: Option<String>,
}
