//! Search index documents.

pub mod document;

pub use document::SearchDocument;
