//! User entity model.

use serde::{Deserialize, Serialize};

use quire_core::types::UserId;

/// The user fields the publication pipeline reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique handle.
    pub user_name: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Email address.
    pub email: Option<String>,
}
