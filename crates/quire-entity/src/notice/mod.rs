//! Notification events emitted to the notification sink.

pub mod event;
pub mod model;

pub use event::NoticeEvent;
pub use model::{Notice, NoticeEntity, NoticeEntityRole};
