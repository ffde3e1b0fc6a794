//! Cache invalidation trait for cached entity views.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// Kind of node whose cached views can be invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// A user profile and everything rendered from it.
    User,
    /// A published article.
    Article,
    /// A draft.
    Draft,
    /// A tag.
    Tag,
}

impl NodeType {
    /// Return the node type name as used in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Article => "Article",
            Self::Draft => "Draft",
            Self::Tag => "Tag",
        }
    }

    /// Build the key prefix under which views of node `id` are cached.
    pub fn cache_key(&self, id: &str) -> String {
        format!("cache:{}:{}", self.as_str(), id)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for the response cache sitting in front of the API.
///
/// The cache is non-authoritative: invalidation only forces the next read to
/// be rebuilt from the persistent store.
#[async_trait]
pub trait CacheInvalidator: Send + Sync + std::fmt::Debug + 'static {
    /// Drop every cached view of the given node.
    async fn invalidate(&self, node_type: NodeType, id: &str) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        assert_eq!(NodeType::User.cache_key("42"), "cache:User:42");
        assert_eq!(NodeType::Article.to_string(), "Article");
    }
}
