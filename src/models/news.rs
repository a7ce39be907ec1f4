//! News article payload, as returned by GNews and served from `/news`.

use serde::{Deserialize, Serialize};

/// One headline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Article {
    pub title: String,
    /// GNews sends `null` for some feeds
    pub description: Option<String>,
    pub content: String,
    pub url: String,
    pub image: Option<String>,
    pub published_at: String,
    pub source: ArticleSource,
}

/// Publisher of an [`Article`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleSource {
    pub name: String,
    pub url: String,
}
