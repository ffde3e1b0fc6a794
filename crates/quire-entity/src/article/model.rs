//! Article entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quire_core::types::{ArticleId, DraftId, UserId};

/// Addresses returned by the content publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedContent {
    /// Content-addressed hash of the published data.
    pub content_address: String,
    /// Address of the published media bundle.
    pub media_address: String,
}

/// The published artifact derived from exactly one draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Unique article identifier.
    pub id: ArticleId,
    /// Source draft; at most one article exists per draft.
    pub draft_id: DraftId,
    /// The author.
    pub author_id: UserId,
    /// Title at publication time.
    pub title: String,
    /// Summary at publication time.
    pub summary: Option<String>,
    /// Rendered content at publication time.
    pub content: String,
    /// Content address from the publisher.
    pub content_address: String,
    /// Media address from the publisher.
    pub media_address: String,
    /// Distinct tag strings.
    pub tags: Vec<String>,
    /// Articles collected by this one.
    pub collection_article_ids: Vec<ArticleId>,
    /// When the article was created.
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// The publisher addresses of this article.
    pub fn published_content(&self) -> PublishedContent {
        PublishedContent {
            content_address: self.content_address.clone(),
            media_address: self.media_address.clone(),
        }
    }
}
