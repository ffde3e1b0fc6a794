//! # quire-database
//!
//! PostgreSQL connection management, the migration runner, and the
//! repository holding the durable job queue.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
