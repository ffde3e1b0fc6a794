//! Search index.

use async_trait::async_trait;

use quire_core::result::AppResult;
use quire_entity::search::SearchDocument;

/// Trait for the full-text search index. Best-effort and rebuildable.
#[async_trait]
pub trait SearchIndex: Send + Sync + std::fmt::Debug + 'static {
    /// Insert or replace documents in `index`.
    async fn upsert(&self, index: &str, documents: Vec<SearchDocument>) -> AppResult<()>;
}
