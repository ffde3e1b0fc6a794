//! Published article entities.

pub mod model;

pub use model::{Article, PublishedContent};
