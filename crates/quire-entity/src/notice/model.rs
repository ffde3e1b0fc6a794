//! Notice model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quire_core::types::{ArticleId, UserId};

use super::event::NoticeEvent;

/// Role an entity plays within a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeEntityRole {
    /// The main subject of the notice.
    Target,
    /// The collecting article in a collection notice.
    Collection,
}

/// An entity referenced by a notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeEntity {
    /// Role of the entity.
    #[serde(rename = "type")]
    pub role: NoticeEntityRole,
    /// Table the entity lives in.
    pub entity_table: String,
    /// Entity identifier.
    pub entity_id: Uuid,
}

impl NoticeEntity {
    /// Reference an article.
    pub fn article(role: NoticeEntityRole, id: ArticleId) -> Self {
        Self {
            role,
            entity_table: "article".to_string(),
            entity_id: id.into_uuid(),
        }
    }
}

/// A fire-and-forget notification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Event type.
    pub event: NoticeEvent,
    /// User who caused the event, if any.
    pub actor_id: Option<UserId>,
    /// User receiving the notice.
    pub recipient_id: UserId,
    /// Referenced entities.
    pub entities: Vec<NoticeEntity>,
}

impl Notice {
    /// Start a notice for `recipient_id`.
    pub fn new(event: NoticeEvent, recipient_id: UserId) -> Self {
        Self {
            event,
            actor_id: None,
            recipient_id,
            entities: Vec::new(),
        }
    }

    /// Set the actor.
    pub fn with_actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Append a referenced entity.
    pub fn with_entity(mut self, entity: NoticeEntity) -> Self {
        self.entities.push(entity);
        self
    }
}
