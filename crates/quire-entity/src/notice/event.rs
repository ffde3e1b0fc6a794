//! Notice event enumeration.

use serde::{Deserialize, Serialize};

/// Event type of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeEvent {
    /// The recipient's article went live.
    ArticlePublished,
    /// A new article collected one of the recipient's articles.
    ArticleNewCollected,
    /// The recipient was mentioned in a new article.
    ArticleMentionedYou,
}

impl NoticeEvent {
    /// Return the event as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArticlePublished => "article_published",
            Self::ArticleNewCollected => "article_new_collected",
            Self::ArticleMentionedYou => "article_mentioned_you",
        }
    }
}

impl std::fmt::Display for NoticeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
