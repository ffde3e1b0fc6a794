//! Background job processing for Quire.
//!
//! This crate provides:
//! - A job store abstraction with in-memory and PostgreSQL backends
//! - A worker runner that drains each job type with bounded concurrency
//! - A maintenance scheduler that recovers stalled jobs
//! - The article publication pipeline and mail/push delivery handlers
//! - A producer API for enqueuing and withdrawing jobs

pub mod context;
pub mod executor;
pub mod host;
pub mod jobs;
pub mod producer;
pub mod runner;
pub mod scheduler;
pub mod services;
pub mod store;

pub use context::JobContext;
pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use host::{Collaborators, WorkerHost};
pub use producer::JobProducer;
pub use runner::WorkerRunner;
pub use scheduler::MaintenanceScheduler;
pub use store::{JobStore, MemoryJobStore, PgJobStore, QueueStats};
