//! Article publication pipeline.
//!
//! One `publish-article` job turns a pending draft into a published article.
//! Steps run strictly in order and report progress after each:
//!
//! | Step                            | Progress | On failure                 |
//! |---------------------------------|----------|----------------------------|
//! | preflight + claim               | 5        | job fails, draft untouched |
//! | publish content, create article | 10       | draft marked `error`       |
//! | commit draft as archived        | 20       | draft marked `error`       |
//! | collection links + notices      | 40       | job fails (notices logged) |
//! | unused asset cleanup            | 45       | logged                     |
//! | asset map swap                  | 50       | job fails                  |
//! | tags                            | 60       | job fails                  |
//! | search index                    | 80       | logged                     |
//! | mention notices                 | 90       | logged                     |
//! | published notice                | 95       | logged                     |
//! | author cache invalidation       | 100      | logged                     |
//!
//! Publishing is the point of no return: failures after it are not rolled
//! back. The draft is claimed with a compare-and-swap from `pending` to
//! `in_progress` before anything is written, so a duplicate dispatch of the
//! same draft becomes a no-op instead of a second article. Until the draft is
//! committed, a failure moves it from `in_progress` to `error`.
//!
//! A job redelivered after its worker died (attempt > 1) finds the draft
//! still `in_progress` and resumes from the publish step. The publisher and
//! every store write are idempotent per draft, so the rerun converges on the
//! same article.

pub mod content;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use quire_core::config::PublicationConfig;
use quire_core::result::AppResult;
use quire_core::traits::{CacheInvalidator, NodeType, ObjectStorage};
use quire_core::types::{ArticleId, AssetId, AssetMapId, DraftId, UserId};
use quire_entity::article::Article;
use quire_entity::asset::EntityType;
use quire_entity::draft::{Draft, PublishState};
use quire_entity::job::{JobType, PublishArticlePayload};
use quire_entity::notice::{Notice, NoticeEntity, NoticeEntityRole, NoticeEvent};
use quire_entity::search::SearchDocument;
use quire_entity::tag::NewTag;

use crate::context::JobContext;
use crate::executor::{JobExecutionError, JobHandler};
use crate::services::{ContentPublisher, ContentStore, NotificationSink, SearchIndex};

use super::with_deadline;

/// Collaborators the pipeline calls out to.
#[derive(Debug, Clone)]
pub struct PublicationServices {
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
}

/// Result stored on a completed `publish-article` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PublicationOutcome {
    /// The draft was published.
    #[serde(rename_all = "camelCase")]
    Published {
        /// Article created from the draft.
        article_id: ArticleId,
        /// Address of the published content.
        content_address: String,
        /// Address of the published media bundle.
        media_address: String,
    },
    /// Nothing to do; the draft was left untouched.
    Skipped {
        /// Why the job was a no-op.
        reason: String,
    },
}

/// Handles `publish-article` jobs.
#[derive(Debug)]
pub struct PublicationJobHandler {
    services: PublicationServices,
    config: PublicationConfig,
}

impl PublicationJobHandler {
    /// Create a new publication handler.
    pub fn new(services: PublicationServices, config: PublicationConfig) -> Self {
        Self { services, config }
    }

    async fn run(
        &self,
        draft_id: DraftId,
        ctx: &JobContext,
    ) -> Result<PublicationOutcome, JobExecutionError> {
        let store = &self.services.store;

        let Some(draft) = self.guard("preflight", store.find_draft(draft_id)).await? else {
            return Ok(skip(ctx, format!("Draft {draft_id} not found.")).await);
        };
        // A redelivered job finds the draft still claimed by its own earlier
        // attempt; every write below tolerates being repeated.
        let resuming = draft.publish_state == PublishState::InProgress && ctx.attempt() > 1;
        if resuming {
            warn!(%draft_id, attempt = ctx.attempt(), "Resuming publication left in progress");
        } else {
            if draft.publish_state != PublishState::Pending {
                return Ok(skip(ctx, format!("Publication of draft {draft_id} is not pending.")).await);
            }
            if draft.is_scheduled_after(Utc::now()) {
                return Ok(skip(ctx, format!("Draft's ({draft_id}) scheduledAt is greater than now")).await);
            }

            let claimed = self
                .guard(
                    "claim",
                    store.transition_publish_state(
                        draft_id,
                        PublishState::Pending,
                        PublishState::InProgress,
                    ),
                )
                .await?;
            if !claimed {
                return Ok(skip(ctx, format!("Publication of draft {draft_id} is not pending.")).await);
            }
        }
        ctx.report_progress(5).await;

        let article = match self.publish(&draft).await {
            Ok(article) => article,
            Err(e) => {
                self.mark_error(draft_id).await;
                return Err(e);
            }
        };
        info!(%draft_id, article_id = %article.id, "Draft content published");
        ctx.report_progress(10).await;

        if let Err(e) = self
            .guard("commit_draft", store.mark_draft_published(draft_id))
            .await
        {
            self.mark_error(draft_id).await;
            return Err(e);
        }
        ctx.report_progress(20).await;

        self.materialize_collection(&draft, &article).await?;
        ctx.report_progress(40).await;

        self.remove_unused_assets(&draft).await;
        ctx.report_progress(45).await;

        self.swap_assets(&draft, &article).await?;
        ctx.report_progress(50).await;

        let tags = self.materialize_tags(&draft, &article).await?;
        ctx.report_progress(60).await;

        self.index_article(&article, tags).await;
        ctx.report_progress(80).await;

        self.notify_mentions(&article).await;
        ctx.report_progress(90).await;

        self.notify(
            Notice::new(NoticeEvent::ArticlePublished, article.author_id)
                .with_entity(NoticeEntity::article(NoticeEntityRole::Target, article.id)),
        )
        .await;
        ctx.report_progress(95).await;

        let author_key = article.author_id.to_string();
        self.best_effort(
            "invalidate_cache",
            self.services.cache.invalidate(NodeType::User, &author_key),
        )
        .await;
        ctx.report_progress(100).await;

        info!(%draft_id, article_id = %article.id, "Article published");
        Ok(PublicationOutcome::Published {
            article_id: article.id,
            content_address: article.content_address,
            media_address: article.media_address,
        })
    }

    /// Publish the content and create the article row.
    async fn publish(&self, draft: &Draft) -> Result<Article, JobExecutionError> {
        let content = self
            .guard("publish", self.services.publisher.publish(draft))
            .await?;
        self.guard(
            "create_article",
            self.services.store.create_article(draft, &content),
        )
        .await
    }

    async fn mark_error(&self, draft_id: DraftId) {
        let marked = self
            .guard(
                "mark_error",
                self.services.store.transition_publish_state(
                    draft_id,
                    PublishState::InProgress,
                    PublishState::Error,
                ),
            )
            .await;
        match marked {
            Ok(true) => warn!(%draft_id, "Draft marked as failed to publish"),
            Ok(false) => warn!(%draft_id, "Draft was no longer in progress when marking it as failed"),
            Err(e) => error!(%draft_id, error = %e, "Failed to mark draft as failed to publish"),
        }
    }

    async fn materialize_collection(
        &self,
        draft: &Draft,
        article: &Article,
    ) -> Result<(), JobExecutionError> {
        let mut seen = HashSet::new();
        let collected: Vec<ArticleId> = draft
            .collection_article_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if collected.is_empty() {
            return Ok(());
        }

        self.guard(
            "collection",
            self.services.store.create_collection(article.id, &collected),
        )
        .await?;

        join_all(collected.iter().map(|id| self.notify_collected(*id, article))).await;
        Ok(())
    }

    async fn notify_collected(&self, collected_id: ArticleId, article: &Article) {
        let found = self
            .best_effort("collection", self.services.store.find_article(collected_id))
            .await
            .flatten();
        let Some(collected) = found else {
            debug!(article_id = %collected_id, "Collected article not found; skipping notice");
            return;
        };

        self.notify(
            Notice::new(NoticeEvent::ArticleNewCollected, collected.author_id)
                .with_actor(article.author_id)
                .with_entity(NoticeEntity::article(NoticeEntityRole::Target, collected.id))
                .with_entity(NoticeEntity::article(NoticeEntityRole::Collection, article.id)),
        )
        .await;
    }

    /// Delete assets mapped to the draft that its content no longer references.
    async fn remove_unused_assets(&self, draft: &Draft) {
        let store = &self.services.store;
        let Some(entries) = self
            .best_effort(
                "asset_cleanup",
                store.find_asset_maps(EntityType::Draft, draft.id.into_uuid()),
            )
            .await
        else {
            return;
        };

        let referenced = content::referenced_asset_uuids(&draft.content);
        let unused: HashMap<AssetId, String> = entries
            .into_iter()
            .filter(|e| !referenced.contains(&e.uuid) && Some(e.asset_id) != draft.cover_asset_id)
            .map(|e| (e.asset_id, e.path))
            .collect();
        if unused.is_empty() {
            return;
        }

        let (asset_ids, paths): (Vec<AssetId>, Vec<String>) = unused.into_iter().unzip();
        if self
            .best_effort("asset_cleanup", store.delete_assets(&asset_ids))
            .await
            .is_none()
        {
            return;
        }
        self.best_effort("asset_cleanup", self.services.storage.delete_many(&paths))
            .await;

        info!(draft_id = %draft.id, removed = asset_ids.len(), "Removed unused assets");
    }

    /// Repoint the draft's remaining asset map rows to the article.
    async fn swap_assets(&self, draft: &Draft, article: &Article) -> Result<(), JobExecutionError> {
        let store = &self.services.store;
        let entries = self
            .guard(
                "asset_swap",
                store.find_asset_maps(EntityType::Draft, draft.id.into_uuid()),
            )
            .await?;
        let ids: Vec<AssetMapId> = entries.iter().map(|e| e.id).collect();
        if ids.is_empty() {
            return Ok(());
        }

        self.guard(
            "asset_swap",
            store.swap_asset_map_entity(&ids, EntityType::Article, article.id.into_uuid()),
        )
        .await
    }

    /// Create-or-fetch every distinct tag and link them to the article.
    /// Returns the tag contents.
    async fn materialize_tags(
        &self,
        draft: &Draft,
        article: &Article,
    ) -> Result<Vec<String>, JobExecutionError> {
        let contents = draft.distinct_tags();
        if contents.is_empty() {
            return Ok(Vec::new());
        }

        let editors = self.default_tag_editors().await;
        let mut tag_ids = Vec::with_capacity(contents.len());
        let mut tags = Vec::with_capacity(contents.len());
        for content in contents {
            let tag = self
                .guard(
                    "tags",
                    self.services.store.create_tag(NewTag {
                        content,
                        editors: editors.clone(),
                        creator: article.author_id,
                    }),
                )
                .await?;
            if !tag_ids.contains(&tag.id) {
                tag_ids.push(tag.id);
                tags.push(tag.content);
            }
        }

        self.guard(
            "tags",
            self.services.store.link_article_tags(article.id, &tag_ids),
        )
        .await?;
        Ok(tags)
    }

    async fn default_tag_editors(&self) -> Vec<UserId> {
        let Some(email) = self.config.default_tag_editor_email.as_deref() else {
            return Vec::new();
        };
        self.best_effort("tags", self.services.store.find_user_by_email(email))
            .await
            .flatten()
            .map(|user| vec![user.id])
            .unwrap_or_default()
    }

    async fn index_article(&self, article: &Article, tags: Vec<String>) {
        let author = self
            .best_effort("search", self.services.store.find_user(article.author_id))
            .await
            .flatten();
        let Some(author) = author else {
            warn!(article_id = %article.id, "Author not found; article not indexed");
            return;
        };

        let document = SearchDocument::from_article(article, &author, tags);
        self.best_effort(
            "search",
            self.services
                .search
                .upsert(&self.config.search_index, vec![document]),
        )
        .await;
    }

    /// Notify every distinct user mentioned in the article.
    async fn notify_mentions(&self, article: &Article) {
        let mut seen = HashSet::new();
        let mentioned: Vec<UserId> = content::mention_ids(&article.content)
            .iter()
            .filter_map(|global_id| content::decode_user_global_id(global_id))
            .filter(|id| seen.insert(*id))
            .collect();

        join_all(mentioned.into_iter().map(|recipient| async move {
            let user = self
                .best_effort("mentions", self.services.store.find_user(recipient))
                .await
                .flatten();
            if user.is_none() {
                debug!(%recipient, "Mentioned user not found; skipping notice");
                return;
            }
            self.notify(
                Notice::new(NoticeEvent::ArticleMentionedYou, recipient)
                    .with_actor(article.author_id)
                    .with_entity(NoticeEntity::article(NoticeEntityRole::Target, article.id)),
            )
            .await;
        }))
        .await;
    }

    async fn notify(&self, notice: Notice) {
        let event = notice.event;
        let recipient = notice.recipient_id;
        if let Err(e) = self
            .guard("notify", self.services.notifier.trigger(notice))
            .await
        {
            warn!(%event, %recipient, error = %e, "Failed to trigger notification");
        }
    }

    async fn guard<T>(
        &self,
        step: &'static str,
        call: impl Future<Output = AppResult<T>> + Send,
    ) -> Result<T, JobExecutionError> {
        with_deadline(step, self.config.step_timeout(), call).await
    }

    /// Run a call whose failure must not affect the job.
    async fn best_effort<T>(
        &self,
        step: &'static str,
        call: impl Future<Output = AppResult<T>> + Send,
    ) -> Option<T> {
        match self.guard(step, call).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(step, error = %e, "Best-effort step failed");
                None
            }
        }
    }
}

async fn skip(ctx: &JobContext, reason: String) -> PublicationOutcome {
    info!(job_id = %ctx.job_id(), %reason, "Publication skipped");
    ctx.report_progress(100).await;
    PublicationOutcome::Skipped { reason }
}

#[async_trait]
impl JobHandler for PublicationJobHandler {
    type Payload = PublishArticlePayload;
    type Output = PublicationOutcome;

    fn job_type(&self) -> JobType {
        JobType::PublishArticle
    }

    async fn execute(
        &self,
        payload: PublishArticlePayload,
        ctx: &JobContext,
    ) -> Result<PublicationOutcome, JobExecutionError> {
        self.run(payload.draft_id, ctx).await
    }
}
