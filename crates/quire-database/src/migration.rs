//! Migration runner for the job queue schema.

use sqlx::PgPool;
use tracing::info;

use quire_core::error::{AppError, ErrorKind};

/// Apply the queue migrations bundled with this crate.
///
/// Only the `jobs` table is owned here; content tables belong to the
/// persistent store and are migrated by it.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Running job queue migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Job queue migrations applied");
    Ok(())
}
