//! PostgreSQL connection pool management.

use std::str::FromStr;

use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use quire_core::config::DatabaseConfig;
use quire_core::error::{AppError, ErrorKind};

use crate::repositories::JobRepository;

/// Application name reported to PostgreSQL (`pg_stat_activity`).
const APPLICATION_NAME: &str = "quire-worker";

/// Wrapper around the sqlx PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connect a pool sized for the worker's handler concurrency.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let options = PgConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Invalid database URL", e)
            })?
            .application_name(APPLICATION_NAME)
            // Queue polling issues the same statements constantly; keep them out of the log.
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        info!(application = APPLICATION_NAME, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Job queue repository sharing this pool.
    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.pool.clone())
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Job store connections closed");
    }
}

/// Mask the password portion of a database URL for safe logging.
fn mask_password(url: &str) -> String {
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    let Some(at_pos) = url[scheme_end..].find('@').map(|p| p + scheme_end) else {
        return url.to_string();
    };
    match url[scheme_end..at_pos].find(':') {
        Some(colon) => format!("{}:****@{}", &url[..scheme_end + colon], &url[at_pos + 1..]),
        None => url.to_string(),
    }
}
