//! Built-in job handler implementations.

pub mod notification;
pub mod publication;

use std::future::Future;
use std::time::Duration;

use quire_core::result::AppResult;

use crate::executor::JobExecutionError;

pub use notification::{DeliveryReport, MailJobHandler, PushJobHandler};
pub use publication::{PublicationJobHandler, PublicationOutcome, PublicationServices};

/// Await a collaborator call for at most `after`, attributing failures to `step`.
pub(crate) async fn with_deadline<T>(
    step: &'static str,
    after: Duration,
    call: impl Future<Output = AppResult<T>>,
) -> Result<T, JobExecutionError> {
    match tokio::time::timeout(after, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(JobExecutionError::Step { step, source }),
        Err(_) => Err(JobExecutionError::Timeout { step, after }),
    }
}
