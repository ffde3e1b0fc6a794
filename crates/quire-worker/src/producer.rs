//! Producer API: the narrow interface callers use to enqueue work.
//!
//! Enqueueing returns as soon as the job is stored; callers observe the
//! outcome asynchronously (for publication, through the draft's state).

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use quire_core::config::{NotificationQueueConfig, PublicationConfig};
use quire_core::error::AppError;
use quire_core::result::AppResult;
use quire_core::types::DraftId;
use quire_entity::job::{CreateJob, JobOptions, JobPriority, JobType, PublishArticlePayload};
use quire_entity::message::{MailMessage, PushMessage};

use crate::store::{JobStore, QueueStats};

/// Enqueues publication and delivery jobs.
#[derive(Debug, Clone)]
pub struct JobProducer {
    store: Arc<dyn JobStore>,
    publication: PublicationConfig,
    notification: NotificationQueueConfig,
}

impl JobProducer {
    /// Create a new producer.
    pub fn new(
        store: Arc<dyn JobStore>,
        publication: PublicationConfig,
        notification: NotificationQueueConfig,
    ) -> Self {
        Self {
            store,
            publication,
            notification,
        }
    }

    /// Enqueue publication of a draft at critical priority.
    ///
    /// Without an explicit delay the configured edit grace period applies.
    /// The store does not deduplicate; a second request for a draft that is
    /// already published is a no-op when it runs.
    pub async fn publish_article(
        &self,
        draft_id: DraftId,
        delay: Option<Duration>,
    ) -> AppResult<Uuid> {
        let delay = delay.unwrap_or_else(|| self.publication.delay());
        let options = JobOptions::new(JobPriority::Critical).with_delay(delay);
        let job = CreateJob::new(
            JobType::PublishArticle,
            &PublishArticlePayload { draft_id },
            options,
        )?;

        let job = self.store.enqueue(job).await?;
        info!(job_id = %job.id, %draft_id, delay_ms = job.delay_ms, "Publication enqueued");
        Ok(job.id)
    }

    /// Enqueue a mail delivery.
    pub async fn send_mail(&self, message: MailMessage) -> AppResult<Uuid> {
        if message.to.iter().all(|to| to.trim().is_empty()) {
            return Err(AppError::validation("Mail requires at least one recipient"));
        }
        self.enqueue_delivery(JobType::SendMail, &message).await
    }

    /// Enqueue a push notification.
    pub async fn push_notification(&self, message: PushMessage) -> AppResult<Uuid> {
        if message.recipients.is_empty() {
            return Err(AppError::validation("Push requires at least one recipient"));
        }
        self.enqueue_delivery(JobType::PushNotification, &message).await
    }

    /// Withdraw a job that has not been dispatched yet.
    pub async fn withdraw(&self, job_id: Uuid) -> AppResult<bool> {
        let withdrawn = self.store.withdraw(job_id).await?;
        info!(%job_id, withdrawn, "Withdraw requested");
        Ok(withdrawn)
    }

    /// Current queue statistics.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        self.store.stats().await
    }

    async fn enqueue_delivery<P: serde::Serialize>(
        &self,
        job_type: JobType,
        payload: &P,
    ) -> AppResult<Uuid> {
        let options =
            JobOptions::new(JobPriority::Normal).keep_last(self.notification.completed_retention);
        let job = self
            .store
            .enqueue(CreateJob::new(job_type, payload, options)?)
            .await?;
        info!(job_id = %job.id, %job_type, "Delivery enqueued");
        Ok(job.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::error::ErrorKind;
    use quire_entity::job::JobStatus;

    use crate::store::MemoryJobStore;

    fn producer() -> (JobProducer, Arc<MemoryJobStore>) {
        let store = Arc::new(MemoryJobStore::new(1000));
        let producer = JobProducer::new(
            store.clone(),
            PublicationConfig::default(),
            NotificationQueueConfig::default(),
        );
        (producer, store)
    }

    #[tokio::test]
    async fn test_publish_article_uses_default_delay_and_critical_priority() {
        let (producer, store) = producer();
        let draft_id = DraftId::new();
        let job_id = producer.publish_article(draft_id, None).await.unwrap();

        let job = store.find(job_id).await.unwrap().unwrap();
        assert_eq!(job.job_type, "publish-article");
        assert_eq!(job.priority, JobPriority::Critical);
        assert_eq!(job.status, JobStatus::Delayed);
        assert_eq!(job.delay_ms, 120_000);
        assert_eq!(job.payload["draftId"], draft_id.to_string());
        assert_eq!(job.retain, 1000);
    }

    #[tokio::test]
    async fn test_send_mail_keeps_small_completed_list() {
        let (producer, store) = producer();
        let job_id = producer
            .send_mail(MailMessage {
                to: vec!["reader@example.com".to_string()],
                from: None,
                subject: Some("Welcome".to_string()),
                html: None,
                template_id: None,
                template_data: None,
            })
            .await
            .unwrap();

        let job = store.find(job_id).await.unwrap().unwrap();
        assert_eq!(job.priority, JobPriority::Normal);
        assert_eq!(job.status, JobStatus::Waiting);
        assert_eq!(job.retain, 100);
    }

    #[tokio::test]
    async fn test_push_without_recipients_is_rejected() {
        let (producer, _) = producer();
        let err = producer
            .push_notification(PushMessage {
                recipients: Vec::new(),
                title: None,
                body: "hi".to_string(),
                link: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
