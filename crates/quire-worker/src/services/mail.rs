//! Mail and push delivery providers.

use async_trait::async_trait;

use quire_core::result::AppResult;
use quire_entity::message::{MailMessage, PushMessage};

/// Trait for the outbound mail provider.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver one message.
    async fn send(&self, message: &MailMessage) -> AppResult<()>;
}

/// Trait for the mobile/web push provider.
#[async_trait]
pub trait PushSender: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver one push message. Returns the number of devices reached.
    async fn push(&self, message: &PushMessage) -> AppResult<usize>;
}
