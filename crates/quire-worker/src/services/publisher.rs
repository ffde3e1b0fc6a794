//! Content-addressed publisher.

use async_trait::async_trait;

use quire_core::result::AppResult;
use quire_entity::article::PublishedContent;
use quire_entity::draft::Draft;

/// Trait for the service that durably publishes draft content.
///
/// Publishing the same content twice yields the same addresses, so a
/// repeated call after a crash is harmless.
#[async_trait]
pub trait ContentPublisher: Send + Sync + std::fmt::Debug + 'static {
    /// Publish a draft's content and return its content and media addresses.
    async fn publish(&self, draft: &Draft) -> AppResult<PublishedContent>;
}
