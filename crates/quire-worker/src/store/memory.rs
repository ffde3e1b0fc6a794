//! In-process job store.

use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use quire_core::error::AppError;
use quire_core::result::AppResult;
use quire_entity::job::{CreateJob, Job, JobStatus, JobType};

use super::{JobStore, QueueStats};

#[derive(Debug)]
struct Entry {
    job: Job,
    /// Insertion order, used as the last tiebreak between equal jobs.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<Uuid, Entry>,
    next_seq: u64,
    /// Finished job ids per type, oldest first.
    finished: HashMap<String, VecDeque<Uuid>>,
}

impl Inner {
    fn active_mut(&mut self, job_id: Uuid) -> AppResult<&mut Job> {
        let entry = self
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| AppError::not_found(format!("Job {job_id} not found")))?;
        if entry.job.status != JobStatus::Active {
            return Err(AppError::conflict(format!(
                "Job {job_id} is {}, not active",
                entry.job.status
            )));
        }
        Ok(&mut entry.job)
    }

    /// Record a finished job and evict the oldest finished jobs of its type
    /// beyond the retention it carries.
    fn retire(&mut self, job_type: String, job_id: Uuid, retain: usize) {
        let finished = self.finished.entry(job_type).or_default();
        finished.retain(|id| *id != job_id);
        finished.push_back(job_id);
        while finished.len() > retain {
            if let Some(evicted) = finished.pop_front() {
                self.jobs.remove(&evicted);
            }
        }
    }
}

/// Job store kept in process memory.
///
/// Jobs are lost on restart. Selection scans the job map, which is fine for
/// the queue depths a single process handles.
#[derive(Debug)]
pub struct MemoryJobStore {
    inner: Mutex<Inner>,
    default_retention: usize,
}

impl MemoryJobStore {
    /// Create an empty store keeping `default_retention` finished jobs per type
    /// unless a job asks otherwise.
    pub fn new(default_retention: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            default_retention: default_retention.max(1),
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AppError::internal("Job store lock poisoned"))
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn enqueue(&self, data: CreateJob) -> AppResult<Job> {
        let retain = data.options.retention.resolve(self.default_retention);
        let job = Job::from_create(&data, retain, Utc::now());

        let mut inner = self.lock()?;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(
            job.id,
            Entry {
                job: job.clone(),
                seq,
            },
        );

        debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            priority = %job.priority,
            delay_ms = job.delay_ms,
            "Enqueued job"
        );
        Ok(job)
    }

    async fn dequeue(&self, job_type: JobType, worker_id: &str) -> AppResult<Option<Job>> {
        let now = Utc::now();
        let mut inner = self.lock()?;

        let next = inner
            .jobs
            .values()
            .filter(|e| e.job.job_type == job_type.as_str() && e.job.is_ready(now))
            .max_by_key(|e| (e.job.priority, Reverse(e.job.run_at), Reverse(e.seq)))
            .map(|e| e.job.id);

        let Some(job_id) = next else {
            return Ok(None);
        };
        let Some(entry) = inner.jobs.get_mut(&job_id) else {
            return Ok(None);
        };

        let job = &mut entry.job;
        job.status = JobStatus::Active;
        job.started_at = Some(now);
        job.worker_id = Some(worker_id.to_string());
        job.attempts += 1;

        debug!(job_id = %job.id, job_type = %job.job_type, attempt = job.attempts, "Dequeued job");
        Ok(Some(job.clone()))
    }

    async fn report_progress(&self, job_id: Uuid, percent: u8) -> AppResult<()> {
        let mut inner = self.lock()?;
        let job = inner.active_mut(job_id)?;
        job.progress = job.progress.max(i16::from(percent.min(100)));
        Ok(())
    }

    async fn resolve(&self, job_id: Uuid, result: serde_json::Value) -> AppResult<()> {
        let mut inner = self.lock()?;
        let job = inner.active_mut(job_id)?;
        job.status = JobStatus::Completed;
        job.progress = 100;
        job.result = Some(result);
        job.finished_at = Some(Utc::now());

        let job_type = job.job_type.clone();
        let retain = usize::try_from(job.retain).unwrap_or(1).max(1);
        inner.retire(job_type, job_id, retain);

        debug!(%job_id, "Job completed");
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        let mut inner = self.lock()?;
        let job = inner.active_mut(job_id)?;
        job.status = JobStatus::Failed;
        job.error_message = Some(error.to_string());
        job.finished_at = Some(Utc::now());

        let job_type = job.job_type.clone();
        let retain = usize::try_from(job.retain).unwrap_or(1).max(1);
        inner.retire(job_type, job_id, retain);

        debug!(%job_id, error, "Job failed");
        Ok(())
    }

    async fn withdraw(&self, job_id: Uuid) -> AppResult<bool> {
        let mut inner = self.lock()?;
        let withdrawable = inner
            .jobs
            .get(&job_id)
            .is_some_and(|e| e.job.status.is_withdrawable());
        if withdrawable {
            inner.jobs.remove(&job_id);
            debug!(%job_id, "Job withdrawn");
        }
        Ok(withdrawable)
    }

    async fn find(&self, job_id: Uuid) -> AppResult<Option<Job>> {
        let inner = self.lock()?;
        Ok(inner.jobs.get(&job_id).map(|e| e.job.clone()))
    }

    async fn recover_stalled(&self, older_than: Duration) -> AppResult<u64> {
        let now = Utc::now();
        let mut inner = self.lock()?;
        let mut recovered = 0;

        for entry in inner.jobs.values_mut() {
            let stalled = entry
                .job
                .active_for(now)
                .is_some_and(|elapsed| elapsed >= older_than);
            if stalled {
                entry.job.status = JobStatus::Waiting;
                entry.job.worker_id = None;
                entry.job.run_at = now;
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    async fn stats(&self) -> AppResult<QueueStats> {
        let now = Utc::now();
        let inner = self.lock()?;
        let mut stats = QueueStats::default();
        for entry in inner.jobs.values() {
            // A delayed job whose time has come is reported as waiting.
            let status = match entry.job.status {
                JobStatus::Delayed if entry.job.run_at <= now => JobStatus::Waiting,
                status => status,
            };
            stats.record(status, 1);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::error::ErrorKind;
    use quire_entity::job::{JobOptions, JobPriority};
    use serde_json::json;

    fn mail(priority: JobPriority) -> CreateJob {
        CreateJob {
            job_type: JobType::SendMail,
            payload: json!({"to": ["reader@example.com"]}),
            options: JobOptions::new(priority),
        }
    }

    #[tokio::test]
    async fn test_dequeue_prefers_priority_then_fifo() {
        let store = MemoryJobStore::new(10);
        let low = store.enqueue(mail(JobPriority::Low)).await.unwrap();
        let first = store.enqueue(mail(JobPriority::High)).await.unwrap();
        let second = store.enqueue(mail(JobPriority::High)).await.unwrap();

        let order: Vec<Uuid> = [
            store.dequeue(JobType::SendMail, "w").await.unwrap(),
            store.dequeue(JobType::SendMail, "w").await.unwrap(),
            store.dequeue(JobType::SendMail, "w").await.unwrap(),
        ]
        .into_iter()
        .map(|j| j.unwrap().id)
        .collect();

        assert_eq!(order, vec![first.id, second.id, low.id]);
        assert!(store.dequeue(JobType::SendMail, "w").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dequeue_filters_by_type() {
        let store = MemoryJobStore::new(10);
        store.enqueue(mail(JobPriority::Normal)).await.unwrap();
        assert!(
            store
                .dequeue(JobType::PushNotification, "w")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delayed_job_is_not_dispatched_early() {
        let store = MemoryJobStore::new(10);
        let data = CreateJob {
            options: JobOptions::new(JobPriority::Critical).with_delay(Duration::from_secs(3600)),
            ..mail(JobPriority::Critical)
        };
        let job = store.enqueue(data).await.unwrap();
        assert_eq!(job.status, JobStatus::Delayed);
        assert!(store.dequeue(JobType::SendMail, "w").await.unwrap().is_none());
        assert_eq!(store.stats().await.unwrap().delayed, 1);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_requires_active() {
        let store = MemoryJobStore::new(10);
        let job = store.enqueue(mail(JobPriority::Normal)).await.unwrap();

        let err = store.report_progress(job.id, 10).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        store.dequeue(JobType::SendMail, "w").await.unwrap();
        store.report_progress(job.id, 40).await.unwrap();
        store.report_progress(job.id, 20).await.unwrap();
        assert_eq!(store.find(job.id).await.unwrap().unwrap().progress, 40);
    }

    #[tokio::test]
    async fn test_withdraw_only_before_dispatch() {
        let store = MemoryJobStore::new(10);
        let waiting = store.enqueue(mail(JobPriority::Normal)).await.unwrap();
        assert!(store.withdraw(waiting.id).await.unwrap());
        assert!(store.find(waiting.id).await.unwrap().is_none());

        let active = store.enqueue(mail(JobPriority::Normal)).await.unwrap();
        store.dequeue(JobType::SendMail, "w").await.unwrap();
        assert!(!store.withdraw(active.id).await.unwrap());
        assert!(!store.withdraw(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_finished_jobs_are_bounded_per_type() {
        let store = MemoryJobStore::new(2);
        let mut ids = Vec::new();
        for _ in 0..3 {
            let job = store.enqueue(mail(JobPriority::Normal)).await.unwrap();
            store.dequeue(JobType::SendMail, "w").await.unwrap();
            store.resolve(job.id, json!({"sent": 1})).await.unwrap();
            ids.push(job.id);
        }

        assert!(store.find(ids[0]).await.unwrap().is_none());
        assert!(store.find(ids[1]).await.unwrap().is_some());
        let last = store.find(ids[2]).await.unwrap().unwrap();
        assert_eq!(last.status, JobStatus::Completed);
        assert_eq!(last.progress, 100);
        assert_eq!(store.stats().await.unwrap().completed, 2);
    }

    #[tokio::test]
    async fn test_resolve_twice_is_a_conflict() {
        let store = MemoryJobStore::new(10);
        let job = store.enqueue(mail(JobPriority::Normal)).await.unwrap();
        store.dequeue(JobType::SendMail, "w").await.unwrap();
        store.fail(job.id, "smtp down").await.unwrap();

        let err = store.resolve(job.id, json!(null)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let failed = store.find(job.id).await.unwrap().unwrap();
        assert_eq!(failed.error_message.as_deref(), Some("smtp down"));
    }

    #[tokio::test]
    async fn test_recover_stalled_returns_job_to_waiting() {
        let store = MemoryJobStore::new(10);
        let job = store.enqueue(mail(JobPriority::Normal)).await.unwrap();
        store.dequeue(JobType::SendMail, "w").await.unwrap();

        assert_eq!(store.recover_stalled(Duration::from_secs(3600)).await.unwrap(), 0);
        assert_eq!(store.recover_stalled(Duration::ZERO).await.unwrap(), 1);

        let again = store.dequeue(JobType::SendMail, "w2").await.unwrap().unwrap();
        assert_eq!(again.id, job.id);
        assert_eq!(again.attempts, 2);
        assert_eq!(again.worker_id.as_deref(), Some("w2"));
    }
}
