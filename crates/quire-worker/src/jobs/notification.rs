//! Mail and push delivery jobs.
//!
//! A provider error fails the job. Deliveries are not retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use quire_entity::job::JobType;
use quire_entity::message::{MailMessage, PushMessage};

use crate::context::JobContext;
use crate::executor::{JobExecutionError, JobHandler};
use crate::services::{Mailer, PushSender};

use super::with_deadline;

/// Result stored on a completed delivery job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    /// Recipients (mail) or devices (push) reached.
    pub delivered: usize,
}

/// Handles `send-mail` jobs
#[derive(Debug)]
pub struct MailJobHandler {
    mailer: Arc<dyn Mailer>,
    timeout: Duration,
}

impl MailJobHandler {
    /// Create a new mail job handler
    pub fn new(mailer: Arc<dyn Mailer>, timeout: Duration) -> Self {
        Self { mailer, timeout }
    }
}

#[async_trait]
impl JobHandler for MailJobHandler {
    type Payload = MailMessage;
    type Output = DeliveryReport;

    fn job_type(&self) -> JobType {
        JobType::SendMail
    }

    async fn execute(
        &self,
        message: MailMessage,
        ctx: &JobContext,
    ) -> Result<DeliveryReport, JobExecutionError> {
        if message.to.is_empty() {
            return Err(JobExecutionError::Failed("Mail has no recipients".to_string()));
        }

        with_deadline("send_mail", self.timeout, self.mailer.send(&message))
            .await
            .map_err(|e| JobExecutionError::Failed(format!("Mail delivery failed: {e}")))?;
        ctx.report_progress(100).await;

        info!(job_id = %ctx.job_id(), recipients = message.to.len(), "Mail sent");
        Ok(DeliveryReport {
            delivered: message.to.len(),
        })
    }
}

/// Handles `push-notification` jobs
#[derive(Debug)]
pub struct PushJobHandler {
    sender: Arc<dyn PushSender>,
    timeout: Duration,
}

impl PushJobHandler {
    /// Create a new push job handler
    pub fn new(sender: Arc<dyn PushSender>, timeout: Duration) -> Self {
        Self { sender, timeout }
    }
}

#[async_trait]
impl JobHandler for PushJobHandler {
    type Payload = PushMessage;
    type Output = DeliveryReport;

    fn job_type(&self) -> JobType {
        JobType::PushNotification
    }

    async fn execute(
        &self,
        message: PushMessage,
        ctx: &JobContext,
    ) -> Result<DeliveryReport, JobExecutionError> {
        if message.recipients.is_empty() {
            return Err(JobExecutionError::Failed("Push has no recipients".to_string()));
        }

        let delivered = with_deadline("push", self.timeout, self.sender.push(&message))
            .await
            .map_err(|e| JobExecutionError::Failed(format!("Push delivery failed: {e}")))?;
        ctx.report_progress(100).await;

        info!(job_id = %ctx.job_id(), delivered, "Push sent");
        Ok(DeliveryReport { delivered })
    }
}
