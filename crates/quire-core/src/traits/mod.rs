//! Collaborator traits defined in `quire-core` and implemented outside it.

pub mod cache;
pub mod storage;

pub use cache::{CacheInvalidator, NodeType};
pub use storage::ObjectStorage;
