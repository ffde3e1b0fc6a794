//! # quire-core
//!
//! Core crate for the Quire publication backend. Contains configuration
//! schemas, typed identifiers, the unified error system, logging setup,
//! and the storage/cache collaborator traits.
//!
//! This crate has **no** internal dependencies on other Quire crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
