//! Notification sink.

use async_trait::async_trait;

use quire_core::result::AppResult;
use quire_entity::notice::Notice;

/// Trait for the in-app notification service.
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug + 'static {
    /// Hand over a notice for delivery.
    async fn trigger(&self, notice: Notice) -> AppResult<()>;
}
