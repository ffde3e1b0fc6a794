//! Background job domain entities.

pub mod kind;
pub mod model;
pub mod options;
pub mod payload;
pub mod status;

pub use kind::JobType;
pub use model::{CreateJob, Job};
pub use options::{JobOptions, Retention};
pub use payload::PublishArticlePayload;
pub use status::{JobPriority, JobStatus};
