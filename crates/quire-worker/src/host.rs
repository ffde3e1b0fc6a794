//! Worker host: wires configuration, the job store, handlers and the
//! maintenance scheduler into one runnable unit.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use quire_core::config::{AppConfig, QueueBackend};
use quire_core::error::AppError;
use quire_core::result::AppResult;
use quire_core::traits::{CacheInvalidator, ObjectStorage};
use quire_database::DatabasePool;
use quire_database::migration::run_migrations;

use crate::executor::JobExecutor;
use crate::jobs::{MailJobHandler, PublicationJobHandler, PublicationServices, PushJobHandler};
use crate::producer::JobProducer;
use crate::runner::WorkerRunner;
use crate::scheduler::{MaintenanceScheduler, sweep_stalled};
use crate::services::{
    ContentPublisher, ContentStore, Mailer, NotificationSink, PushSender, SearchIndex,
};
use crate::store::{JobStore, MemoryJobStore, PgJobStore};

/// Implementations of every external collaborator, supplied by the embedding
/// application.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Drafts, articles, tags, collections and asset maps.
    pub store: Arc<dyn ContentStore>,
    /// Content-addressed publisher.
    pub publisher: Arc<dyn ContentPublisher>,
    /// Full-text search index.
    pub search: Arc<dyn SearchIndex>,
    /// In-app notifications.
    pub notifier: Arc<dyn NotificationSink>,
    /// Binary asset storage.
    pub storage: Arc<dyn ObjectStorage>,
    /// Cached entity views.
    pub cache: Arc<dyn CacheInvalidator>,
    /// Outbound mail.
    pub mailer: Arc<dyn Mailer>,
    /// Push delivery.
    pub push: Arc<dyn PushSender>,
}

/// A configured worker process.
#[derive(Debug)]
pub struct WorkerHost {
    config: AppConfig,
    store: Arc<dyn JobStore>,
    executor: Arc<JobExecutor>,
    database: Option<DatabasePool>,
}

impl WorkerHost {
    /// Build a host with the job store selected by `queue.backend`.
    ///
    /// The Postgres backend connects and applies the queue migrations.
    pub async fn build(config: AppConfig, collaborators: Collaborators) -> AppResult<Self> {
        let retention = config.queue.completed_retention;
        let (store, database) = match config.queue.backend {
            QueueBackend::Memory => {
                let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new(retention));
                (store, None)
            }
            QueueBackend::Postgres => {
                let db_config = config.database.as_ref().ok_or_else(|| {
                    AppError::configuration("queue.backend = postgres requires [database]")
                })?;
                let pool = DatabasePool::connect(db_config).await?;
                run_migrations(pool.pool()).await?;
                let repo = Arc::new(pool.jobs());
                let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(repo, retention));
                (store, Some(pool))
            }
        };

        info!(backend = ?config.queue.backend, "Job store ready");
        let mut host = Self::with_store(config, store, collaborators);
        host.database = database;
        Ok(host)
    }

    /// Build a host on an existing store.
    pub fn with_store(
        config: AppConfig,
        store: Arc<dyn JobStore>,
        collaborators: Collaborators,
    ) -> Self {
        let services = PublicationServices {
            store: collaborators.store,
            publisher: collaborators.publisher,
            search: collaborators.search,
            notifier: collaborators.notifier,
            storage: collaborators.storage,
            cache: collaborators.cache,
        };
        let delivery_timeout = config.notification.delivery_timeout();

        let mut executor = JobExecutor::new();
        executor.register(
            PublicationJobHandler::new(services, config.publication.clone()),
            config.publication.concurrency,
        );
        executor.register(
            MailJobHandler::new(collaborators.mailer, delivery_timeout),
            config.notification.concurrency,
        );
        executor.register(
            PushJobHandler::new(collaborators.push, delivery_timeout),
            config.notification.concurrency,
        );

        Self {
            config,
            store,
            executor: Arc::new(executor),
            database: None,
        }
    }

    /// Producer bound to this host's store.
    pub fn producer(&self) -> JobProducer {
        JobProducer::new(
            Arc::clone(&self.store),
            self.config.publication.clone(),
            self.config.notification.clone(),
        )
    }

    /// The job store.
    pub fn store(&self) -> Arc<dyn JobStore> {
        Arc::clone(&self.store)
    }

    /// A runner over this host's store and handlers.
    pub fn runner(&self) -> WorkerRunner {
        WorkerRunner::new(
            Arc::clone(&self.store),
            Arc::clone(&self.executor),
            self.config.queue.clone(),
        )
    }

    /// Process jobs until `cancel` turns `true`, then shut down gracefully.
    pub async fn run(&self, cancel: watch::Receiver<bool>) -> AppResult<()> {
        // Jobs left active by a previous process are picked up again first.
        if let Err(e) = sweep_stalled(self.store.as_ref(), self.config.queue.stalled_after()).await
        {
            warn!(error = %e, "Initial stalled job sweep failed");
        }

        let mut scheduler =
            MaintenanceScheduler::new(Arc::clone(&self.store), self.config.queue.clone()).await?;
        scheduler.start().await?;

        self.runner().run(cancel).await;

        if let Err(e) = scheduler.shutdown().await {
            error!(error = %e, "Failed to stop maintenance scheduler");
        }
        if let Some(database) = &self.database {
            database.close().await;
        }
        Ok(())
    }
}
