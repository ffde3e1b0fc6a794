//! Shared value types.

pub mod id;

pub use id::{ArticleId, AssetId, AssetMapId, DraftId, TagId, UserId};
