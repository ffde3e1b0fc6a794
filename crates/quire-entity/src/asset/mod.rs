//! Uploaded asset ownership entities.

pub mod model;

pub use model::{AssetMapEntry, EntityType};
