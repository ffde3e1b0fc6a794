//! Object storage trait for uploaded binary assets.

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for the object storage holding uploaded assets.
///
/// The publication pipeline only ever removes orphaned objects, so the
/// surface is deliberately narrow. Implementations live outside the core
/// (S3, local disk, ...).
#[async_trait]
pub trait ObjectStorage: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "s3", "local").
    fn provider_type(&self) -> &str;

    /// Delete the object stored at `path`. Deleting a missing object is not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Delete several objects, stopping at the first failure.
    async fn delete_many(&self, paths: &[String]) -> AppResult<()> {
        for path in paths {
            self.delete(path).await?;
        }
        Ok(())
    }
}
