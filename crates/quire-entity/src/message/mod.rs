//! Outbound mail and push messages carried by notification jobs.

pub mod mail;
pub mod push;

pub use mail::MailMessage;
pub use push::PushMessage;
