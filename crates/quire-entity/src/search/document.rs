//! Denormalized article search document.

use serde::{Deserialize, Serialize};

use quire_core::types::{ArticleId, UserId};

use crate::article::Article;
use crate::user::User;

/// Article fields plus author display fields and resolved tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    /// Article identifier, used as the document id.
    pub id: ArticleId,
    /// Title.
    pub title: String,
    /// Summary.
    pub summary: Option<String>,
    /// Rendered content.
    pub content: String,
    /// Author identifier.
    pub author_id: UserId,
    /// Author handle.
    pub user_name: String,
    /// Author display name.
    pub display_name: String,
    /// Tag strings.
    pub tags: Vec<String>,
}

impl SearchDocument {
    /// Denormalize an article with its author and tags.
    pub fn from_article(article: &Article, author: &User, tags: Vec<String>) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            summary: article.summary.clone(),
            content: article.content.clone(),
            author_id: article.author_id,
            user_name: author.user_name.clone(),
            display_name: author.display_name.clone(),
            tags,
        }
    }
}
