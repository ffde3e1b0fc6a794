//! Draft entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quire_core::types::{ArticleId, AssetId, DraftId, UserId};

use super::state::PublishState;

/// Authoring content prior to publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// Unique draft identifier.
    pub id: DraftId,
    /// The author; sole owner until publication.
    pub author_id: UserId,
    /// Title.
    pub title: String,
    /// Optional summary shown in listings.
    pub summary: Option<String>,
    /// Rendered HTML content.
    pub content: String,
    /// Tag strings as typed by the author; may contain duplicates.
    pub tags: Vec<String>,
    /// Cover image asset.
    pub cover_asset_id: Option<AssetId>,
    /// Articles this draft collects.
    pub collection_article_ids: Vec<ArticleId>,
    /// Publication state.
    pub publish_state: PublishState,
    /// Do not publish before this instant.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Set once the draft has become immutable history.
    pub archived: bool,
    /// When the draft was created.
    pub created_at: DateTime<Utc>,
    /// When the draft was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    /// Whether publication is scheduled strictly after `now`.
    pub fn is_scheduled_after(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at.is_some_and(|at| at > now)
    }

    /// Tag strings trimmed, without blanks, deduplicated in first-seen order.
    pub fn distinct_tags(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .filter(|tag| seen.insert(tag.to_string()))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(tags: &[&str]) -> Draft {
        let now = Utc::now();
        Draft {
            id: DraftId::new(),
            author_id: UserId::new(),
            title: "Hello".to_string(),
            summary: None,
            content: "<p>hi</p>".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            cover_asset_id: None,
            collection_article_ids: Vec::new(),
            publish_state: PublishState::Pending,
            scheduled_at: None,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_distinct_tags_keeps_first_seen_order() {
        let d = draft(&["rust", "go", " rust ", "", "go", "zig"]);
        assert_eq!(d.distinct_tags(), vec!["rust", "go", "zig"]);
    }

    #[test]
    fn test_scheduled_after() {
        let mut d = draft(&[]);
        let now = Utc::now();
        assert!(!d.is_scheduled_after(now));
        d.scheduled_at = Some(now + chrono::Duration::hours(1));
        assert!(d.is_scheduled_after(now));
        d.scheduled_at = Some(now - chrono::Duration::hours(1));
        assert!(!d.is_scheduled_after(now));
    }
}
