//! Shared test helpers for integration tests.
//!
//! Every collaborator trait has an in-memory fake that records the calls it
//! receives. `TestWorker` wires them to a `MemoryJobStore`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use quire_core::config::AppConfig;
use quire_core::error::AppError;
use quire_core::result::AppResult;
use quire_core::traits::{CacheInvalidator, NodeType, ObjectStorage};
use quire_core::types::{ArticleId, AssetId, AssetMapId, DraftId, TagId, UserId};
use quire_entity::article::{Article, PublishedContent};
use quire_entity::asset::{AssetMapEntry, EntityType};
use quire_entity::draft::{Draft, PublishState};
use quire_entity::job::{Job, JobType};
use quire_entity::message::{MailMessage, PushMessage};
use quire_entity::notice::{Notice, NoticeEvent};
use quire_entity::search::SearchDocument;
use quire_entity::tag::{NewTag, Tag};
use quire_entity::user::User;
use quire_worker::services::{
    ContentPublisher, ContentStore, Mailer, NotificationSink, PushSender, SearchIndex,
};
use quire_worker::store::{JobStore, MemoryJobStore};
use quire_worker::{Collaborators, JobProducer, WorkerHost, WorkerRunner};

/// Build a pending draft with no tags, collection or assets.
pub fn draft(author_id: UserId) -> Draft {
    let now = Utc::now();
    Draft {
        id: DraftId::new(),
        author_id,
        title: "On queues".to_string(),
        summary: Some("Why jobs stall".to_string()),
        content: "<p>Queues are everywhere.</p>".to_string(),
        tags: Vec::new(),
        cover_asset_id: None,
        collection_article_ids: Vec::new(),
        publish_state: PublishState::Pending,
        scheduled_at: None,
        archived: false,
        created_at: now,
        updated_at: now,
    }
}

/// Build a user.
pub fn user(name: &str) -> User {
    User {
        id: UserId::new(),
        user_name: name.to_string(),
        display_name: name.to_uppercase(),
        email: Some(format!("{name}@example.com")),
    }
}

/// A mention anchor as the editor renders it.
pub fn mention(global_id: &str) -> String {
    format!(r#"<a class="mention" href="/@someone" data-id="{global_id}">@someone</a>"#)
}

#[derive(Debug, Default)]
struct StoreState {
    drafts: HashMap<DraftId, Draft>,
    articles: HashMap<ArticleId, Article>,
    users: HashMap<UserId, User>,
    tags: Vec<Tag>,
    article_tags: HashMap<ArticleId, Vec<TagId>>,
    collections: Vec<(ArticleId, ArticleId)>,
    asset_maps: Vec<AssetMapEntry>,
    deleted_assets: Vec<AssetId>,
}

/// In-memory content store.
#[derive(Debug, Default)]
pub struct FakeContentStore {
    state: Mutex<StoreState>,
    /// Fail `find_user` calls.
    pub fail_user_lookup: AtomicBool,
    /// Fail `mark_draft_published` calls.
    pub fail_commit: AtomicBool,
    /// Fail `create_tag` calls.
    pub fail_tags: AtomicBool,
}

impl FakeContentStore {
    /// Force a draft into `state`, as a crashed or concurrent run would leave it.
    pub fn set_publish_state(&self, id: DraftId, state: PublishState) {
        if let Some(draft) = self.state.lock().unwrap().drafts.get_mut(&id) {
            draft.publish_state = state;
        }
    }

    pub fn add_draft(&self, draft: Draft) -> DraftId {
        let id = draft.id;
        self.state.lock().unwrap().drafts.insert(id, draft);
        id
    }

    pub fn add_user(&self, user: User) -> UserId {
        let id = user.id;
        self.state.lock().unwrap().users.insert(id, user);
        id
    }

    /// Insert an already published article written by `author_id`.
    pub fn add_article(&self, author_id: UserId) -> ArticleId {
        let article = Article {
            id: ArticleId::new(),
            draft_id: DraftId::new(),
            author_id,
            title: "Earlier work".to_string(),
            summary: None,
            content: "<p>earlier</p>".to_string(),
            content_address: "bafy-earlier".to_string(),
            media_address: "bafy-earlier-media".to_string(),
            tags: Vec::new(),
            collection_article_ids: Vec::new(),
            created_at: Utc::now(),
        };
        let id = article.id;
        self.state.lock().unwrap().articles.insert(id, article);
        id
    }

    pub fn add_tag(&self, content: &str, creator: UserId) -> TagId {
        let tag = Tag {
            id: TagId::new(),
            content: content.to_string(),
            editors: Vec::new(),
            creator,
            created_at: Utc::now(),
        };
        let id = tag.id;
        self.state.lock().unwrap().tags.push(tag);
        id
    }

    /// Map a new asset to a draft. Returns the asset and its UUID.
    pub fn add_draft_asset(&self, draft_id: DraftId) -> (AssetId, Uuid) {
        let entry = AssetMapEntry {
            id: AssetMapId::new(),
            asset_id: AssetId::new(),
            uuid: Uuid::new_v4(),
            path: format!("embed/{}.png", Uuid::new_v4()),
            entity_type: EntityType::Draft,
            entity_id: draft_id.into_uuid(),
        };
        let ids = (entry.asset_id, entry.uuid);
        self.state.lock().unwrap().asset_maps.push(entry);
        ids
    }

    pub fn draft(&self, id: DraftId) -> Draft {
        self.state.lock().unwrap().drafts[&id].clone()
    }

    pub fn articles_for(&self, draft_id: DraftId) -> Vec<Article> {
        let state = self.state.lock().unwrap();
        state
            .articles
            .values()
            .filter(|a| a.draft_id == draft_id)
            .cloned()
            .collect()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.state.lock().unwrap().tags.clone()
    }

    /// Tag contents linked to an article.
    pub fn article_tag_contents(&self, article_id: ArticleId) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let ids = state.article_tags.get(&article_id).cloned().unwrap_or_default();
        ids.iter()
            .filter_map(|id| state.tags.iter().find(|t| t.id == *id))
            .map(|t| t.content.clone())
            .collect()
    }

    pub fn collections(&self) -> Vec<(ArticleId, ArticleId)> {
        self.state.lock().unwrap().collections.clone()
    }

    pub fn asset_maps(&self) -> Vec<AssetMapEntry> {
        self.state.lock().unwrap().asset_maps.clone()
    }

    pub fn deleted_assets(&self) -> Vec<AssetId> {
        self.state.lock().unwrap().deleted_assets.clone()
    }
}

#[async_trait]
impl ContentStore for FakeContentStore {
    async fn find_draft(&self, id: DraftId) -> AppResult<Option<Draft>> {
        Ok(self.state.lock().unwrap().drafts.get(&id).cloned())
    }

    async fn transition_publish_state(
        &self,
        id: DraftId,
        from: PublishState,
        to: PublishState,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state.drafts.get_mut(&id) {
            Some(draft) if draft.publish_state == from => {
                draft.publish_state = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_draft_published(&self, id: DraftId) -> AppResult<()> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(AppError::database("connection reset"));
        }
        let mut state = self.state.lock().unwrap();
        let draft = state
            .drafts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("draft"))?;
        draft.archived = true;
        draft.publish_state = PublishState::Published;
        draft.updated_at = Utc::now();
        Ok(())
    }

    async fn create_article(
        &self,
        draft: &Draft,
        content: &PublishedContent,
    ) -> AppResult<Article> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.articles.values().find(|a| a.draft_id == draft.id) {
            return Ok(existing.clone());
        }
        let article = Article {
            id: ArticleId::new(),
            draft_id: draft.id,
            author_id: draft.author_id,
            title: draft.title.clone(),
            summary: draft.summary.clone(),
            content: draft.content.clone(),
            content_address: content.content_address.clone(),
            media_address: content.media_address.clone(),
            tags: draft.distinct_tags(),
            collection_article_ids: draft.collection_article_ids.clone(),
            created_at: Utc::now(),
        };
        state.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn find_article(&self, id: ArticleId) -> AppResult<Option<Article>> {
        Ok(self.state.lock().unwrap().articles.get(&id).cloned())
    }

    async fn create_collection(
        &self,
        entrance_id: ArticleId,
        article_ids: &[ArticleId],
    ) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        for id in article_ids {
            if !state.collections.contains(&(entrance_id, *id)) {
                state.collections.push((entrance_id, *id));
            }
        }
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        if self.fail_user_lookup.load(Ordering::SeqCst) {
            return Err(AppError::database("user lookup failed"));
        }
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn create_tag(&self, tag: NewTag) -> AppResult<Tag> {
        if self.fail_tags.load(Ordering::SeqCst) {
            return Err(AppError::database("tag insert failed"));
        }
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.tags.iter().find(|t| t.content == tag.content) {
            return Ok(existing.clone());
        }
        let created = Tag {
            id: TagId::new(),
            content: tag.content,
            editors: tag.editors,
            creator: tag.creator,
            created_at: Utc::now(),
        };
        state.tags.push(created.clone());
        Ok(created)
    }

    async fn link_article_tags(&self, article_id: ArticleId, tag_ids: &[TagId]) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let linked = state.article_tags.entry(article_id).or_default();
        for id in tag_ids {
            if !linked.contains(id) {
                linked.push(*id);
            }
        }
        Ok(())
    }

    async fn find_asset_maps(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> AppResult<Vec<AssetMapEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .asset_maps
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn delete_assets(&self, asset_ids: &[AssetId]) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.asset_maps.retain(|e| !asset_ids.contains(&e.asset_id));
        state.deleted_assets.extend_from_slice(asset_ids);
        Ok(())
    }

    async fn swap_asset_map_entity(
        &self,
        asset_map_ids: &[AssetMapId],
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        for entry in state
            .asset_maps
            .iter_mut()
            .filter(|e| asset_map_ids.contains(&e.id))
        {
            entry.entity_type = entity_type;
            entry.entity_id = entity_id;
        }
        Ok(())
    }
}

/// How the fake publisher answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublisherMode {
    #[default]
    Succeed,
    Fail,
    Hang,
}

/// Content publisher returning deterministic addresses.
#[derive(Debug, Default)]
pub struct FakePublisher {
    mode: Mutex<PublisherMode>,
    pub calls: AtomicUsize,
}

impl FakePublisher {
    pub fn set_mode(&self, mode: PublisherMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentPublisher for FakePublisher {
    async fn publish(&self, draft: &Draft) -> AppResult<PublishedContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();
        match mode {
            PublisherMode::Succeed => Ok(PublishedContent {
                content_address: format!("bafy-content-{}", draft.id),
                media_address: format!("bafy-media-{}", draft.id),
            }),
            PublisherMode::Fail => Err(AppError::external_service("publisher unreachable")),
            PublisherMode::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Err(AppError::external_service("publisher woke up"))
            }
        }
    }
}

/// Search index recording upserts.
#[derive(Debug, Default)]
pub struct RecordingSearch {
    pub upserts: Mutex<Vec<(String, Vec<SearchDocument>)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl SearchIndex for RecordingSearch {
    async fn upsert(&self, index: &str, documents: Vec<SearchDocument>) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("search cluster down"));
        }
        self.upserts
            .lock()
            .unwrap()
            .push((index.to_string(), documents));
        Ok(())
    }
}

/// Notification sink recording notices.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn of(&self, event: NoticeEvent) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.event == event)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn trigger(&self, notice: Notice) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("notification service down"));
        }
        self.notices.lock().unwrap().push(notice);
        Ok(())
    }
}

/// Object storage recording deleted paths.
#[derive(Debug, Default)]
pub struct RecordingStorage {
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

/// Cache recording invalidations.
#[derive(Debug, Default)]
pub struct RecordingCache {
    pub invalidated: Mutex<Vec<String>>,
}

#[async_trait]
impl CacheInvalidator for RecordingCache {
    async fn invalidate(&self, node_type: NodeType, id: &str) -> AppResult<()> {
        self.invalidated
            .lock()
            .unwrap()
            .push(node_type.cache_key(id));
        Ok(())
    }
}

/// Mailer recording messages.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("smtp rejected"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Push sender reaching one device per recipient.
#[derive(Debug, Default)]
pub struct RecordingPush {
    pub pushed: Mutex<Vec<PushMessage>>,
}

#[async_trait]
impl PushSender for RecordingPush {
    async fn push(&self, message: &PushMessage) -> AppResult<usize> {
        self.pushed.lock().unwrap().push(message.clone());
        Ok(message.recipients.len())
    }
}

/// A worker host over a memory store and recording fakes.
pub struct TestWorker {
    pub content: Arc<FakeContentStore>,
    pub publisher: Arc<FakePublisher>,
    pub search: Arc<RecordingSearch>,
    pub notifier: Arc<RecordingNotifier>,
    pub storage: Arc<RecordingStorage>,
    pub cache: Arc<RecordingCache>,
    pub mailer: Arc<RecordingMailer>,
    pub push: Arc<RecordingPush>,
    pub store: Arc<MemoryJobStore>,
    pub host: WorkerHost,
}

impl TestWorker {
    /// Create a worker with default configuration and a fast poll interval.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.queue.poll_interval_ms = 10;
        config.queue.shutdown_grace_seconds = 5;
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let content = Arc::new(FakeContentStore::default());
        let publisher = Arc::new(FakePublisher::default());
        let search = Arc::new(RecordingSearch::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let storage = Arc::new(RecordingStorage::default());
        let cache = Arc::new(RecordingCache::default());
        let mailer = Arc::new(RecordingMailer::default());
        let push = Arc::new(RecordingPush::default());
        let store = Arc::new(MemoryJobStore::new(config.queue.completed_retention));

        let collaborators = Collaborators {
            store: content.clone(),
            publisher: publisher.clone(),
            search: search.clone(),
            notifier: notifier.clone(),
            storage: storage.clone(),
            cache: cache.clone(),
            mailer: mailer.clone(),
            push: push.clone(),
        };
        let host = WorkerHost::with_store(config, store.clone(), collaborators);

        Self {
            content,
            publisher,
            search,
            notifier,
            storage,
            cache,
            mailer,
            push,
            store,
            host,
        }
    }

    /// The recording fakes as host collaborators.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            store: self.content.clone(),
            publisher: self.publisher.clone(),
            search: self.search.clone(),
            notifier: self.notifier.clone(),
            storage: self.storage.clone(),
            cache: self.cache.clone(),
            mailer: self.mailer.clone(),
            push: self.push.clone(),
        }
    }

    pub fn producer(&self) -> JobProducer {
        self.host.producer()
    }

    pub fn runner(&self) -> WorkerRunner {
        self.host.runner()
    }

    /// Enqueue a publication without delay and process it inline.
    pub async fn publish_now(&self, draft_id: DraftId) -> Job {
        let job_id = self
            .producer()
            .publish_article(draft_id, Some(Duration::ZERO))
            .await
            .expect("enqueue publication");
        let processed = self
            .runner()
            .run_next(JobType::PublishArticle)
            .await
            .expect("run publication");
        assert_eq!(processed, Some(job_id));
        self.job(job_id).await
    }

    /// Load a retained job.
    pub async fn job(&self, job_id: Uuid) -> Job {
        self.store
            .find(job_id)
            .await
            .expect("find job")
            .expect("job retained")
    }
}
