//! Persistent store for drafts, articles, tags, collections and assets.

use async_trait::async_trait;
use uuid::Uuid;

use quire_core::result::AppResult;
use quire_core::types::{ArticleId, AssetId, AssetMapId, DraftId, TagId, UserId};
use quire_entity::article::{Article, PublishedContent};
use quire_entity::asset::{AssetMapEntry, EntityType};
use quire_entity::draft::{Draft, PublishState};
use quire_entity::tag::{NewTag, Tag};
use quire_entity::user::User;

/// Trait for the transactional content store.
///
/// The store is the single source of truth for draft and article state and
/// must serialize conflicting writes itself.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Load a draft.
    async fn find_draft(&self, id: DraftId) -> AppResult<Option<Draft>>;

    /// Atomically move a draft from `from` to `to`.
    ///
    /// Returns `true` only for the caller whose update matched `from`.
    async fn transition_publish_state(
        &self,
        id: DraftId,
        from: PublishState,
        to: PublishState,
    ) -> AppResult<bool>;

    /// Persist `archived = true, publish_state = published` on a draft.
    async fn mark_draft_published(&self, id: DraftId) -> AppResult<()>;

    /// Create the article for a draft, or return the one that already exists
    /// for it. At most one article exists per draft.
    async fn create_article(&self, draft: &Draft, content: &PublishedContent)
    -> AppResult<Article>;

    /// Load an article.
    async fn find_article(&self, id: ArticleId) -> AppResult<Option<Article>>;

    /// Link `entrance_id` to every article in `article_ids` as a collection.
    /// Links that already exist are kept as they are.
    async fn create_collection(
        &self,
        entrance_id: ArticleId,
        article_ids: &[ArticleId],
    ) -> AppResult<()>;

    /// Load a user.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Load a user by email address.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a tag, or return the existing tag with the same content.
    async fn create_tag(&self, tag: NewTag) -> AppResult<Tag>;

    /// Link an article to tags. Existing links are left in place.
    async fn link_article_tags(&self, article_id: ArticleId, tag_ids: &[TagId]) -> AppResult<()>;

    /// List asset map rows owned by an entity.
    async fn find_asset_maps(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> AppResult<Vec<AssetMapEntry>>;

    /// Delete assets together with their asset map rows.
    async fn delete_assets(&self, asset_ids: &[AssetId]) -> AppResult<()>;

    /// Repoint asset map rows to another owning entity.
    async fn swap_asset_map_entity(
        &self,
        asset_map_ids: &[AssetMapId],
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> AppResult<()>;
}
