//! Collaborator traits consumed by the job handlers.
//!
//! Each trait decouples a handler from a concrete integration (database,
//! content-addressed publisher, search cluster, mail provider, ...). The
//! host application injects implementations; tests inject fakes.

pub mod mail;
pub mod notifier;
pub mod publisher;
pub mod search;
pub mod store;

pub use mail::{Mailer, PushSender};
pub use notifier::NotificationSink;
pub use publisher::ContentPublisher;
pub use search::SearchIndex;
pub use store::ContentStore;
