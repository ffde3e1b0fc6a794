//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate. Each
//! sub-module represents a logical configuration section; every section has
//! defaults so an empty configuration is valid for the in-memory queue.

pub mod database;
pub mod logging;
pub mod notification;
pub mod publication;
pub mod queue;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::notification::NotificationQueueConfig;
pub use self::publication::PublicationConfig;
pub use self::queue::{QueueBackend, QueueConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// configuration files (default + environment overlay) and environment
/// variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Database connection settings (required for the Postgres queue backend).
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Job queue and worker pool settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Publication pipeline settings.
    #[serde(default)]
    pub publication: PublicationConfig,
    /// Mail/push delivery settings.
    #[serde(default)]
    pub notification: NotificationQueueConfig,
}

impl AppConfig {
    /// Load configuration from files and the environment.
    ///
    /// Merges `config/default` with an environment-specific overlay and
    /// environment variables prefixed with `QUIRE__` (sections separated by
    /// `__`, e.g. `QUIRE__QUEUE__BACKEND=postgres`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("QUIRE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app.validate()?;
        Ok(app)
    }

    /// Check cross-section constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.queue.backend == QueueBackend::Postgres && self.database.is_none() {
            return Err(AppError::configuration(
                "queue.backend = \"postgres\" requires a [database] section",
            ));
        }
        if self.publication.concurrency == 0 || self.notification.concurrency == 0 {
            return Err(AppError::configuration(
                "Worker concurrency must be at least 1",
            ));
        }
        if self.queue.completed_retention == 0 {
            return Err(AppError::configuration(
                "queue.completed_retention must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.publication.delay_ms, 120_000);
        assert_eq!(config.notification.completed_retention, 100);
        assert_eq!(config.queue.backend, QueueBackend::Memory);
    }

    #[test]
    fn test_postgres_backend_requires_database() {
        let mut config = AppConfig::default();
        config.queue.backend = QueueBackend::Postgres;
        let err = config.validate().expect_err("should reject");
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "publication": { "concurrency": 3 },
            "queue": { "backend": "postgres" },
            "database": { "url": "postgres://localhost/quire" }
        }))
        .expect("deserialize");

        assert_eq!(config.publication.concurrency, 3);
        assert_eq!(config.publication.step_timeout_seconds, 30);
        assert_eq!(config.queue.poll_interval_ms, 500);
        assert!(config.validate().is_ok());
    }
}
