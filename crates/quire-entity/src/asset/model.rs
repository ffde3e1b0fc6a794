//! Asset map entity model.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use quire_core::types::{AssetId, AssetMapId};

/// Kind of entity that can own assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// A draft.
    Draft,
    /// A published article.
    Article,
    /// A user profile (avatars, banners).
    User,
}

impl EntityType {
    /// Return the entity type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Article => "article",
            Self::User => "user",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One asset map row joined with the asset it points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMapEntry {
    /// Asset map row identifier.
    pub id: AssetMapId,
    /// The mapped asset.
    pub asset_id: AssetId,
    /// Public UUID embedded in asset URLs.
    pub uuid: Uuid,
    /// Object storage path of the binary.
    pub path: String,
    /// Owning entity type.
    pub entity_type: EntityType,
    /// Owning entity identifier.
    pub entity_id: Uuid,
}
