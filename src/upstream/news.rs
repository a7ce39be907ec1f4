//! GNews client
//!
//! Maps a news category to GNews top-headlines query parameters.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::models::Article;
use crate::upstream::{decode_json, parse_base, read_success_body, send, Fetch, UpstreamError};

// == News Category ==
/// Categories the gateway knows how to ask GNews for.
///
/// Anything unrecognized folds into [`NewsCategory::General`], so the cache
/// key space is exactly these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewsCategory {
    General,
    Vietnam,
    World,
    Business,
    Science,
    Health,
    Sports,
    Entertainment,
    Education,
    Traffic,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 10] = [
        NewsCategory::General,
        NewsCategory::Vietnam,
        NewsCategory::World,
        NewsCategory::Business,
        NewsCategory::Science,
        NewsCategory::Health,
        NewsCategory::Sports,
        NewsCategory::Entertainment,
        NewsCategory::Education,
        NewsCategory::Traffic,
    ];

    /// Parses a request token, case- and whitespace-insensitively.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == token)
            .unwrap_or(NewsCategory::General)
    }

    /// Canonical name, also used as the cache key.
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::General => "general",
            NewsCategory::Vietnam => "vietnam",
            NewsCategory::World => "world",
            NewsCategory::Business => "business",
            NewsCategory::Science => "science",
            NewsCategory::Health => "health",
            NewsCategory::Sports => "sports",
            NewsCategory::Entertainment => "entertainment",
            NewsCategory::Education => "education",
            NewsCategory::Traffic => "traffic",
        }
    }

    /// GNews filter parameters for this category, `apikey` and `lang` excluded.
    ///
    /// Education and traffic have no GNews category and use an OR-joined
    /// Vietnamese keyword query instead.
    pub fn query_params(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            NewsCategory::Education => vec![
                ("country", "vn"),
                ("q", "trường học OR sinh viên OR giáo dục"),
            ],
            NewsCategory::Traffic => vec![("country", "vn"), ("q", "xe OR giao thông OR đường")],
            NewsCategory::Vietnam => vec![("category", "nation"), ("country", "vn")],
            other => vec![("category", other.as_str()), ("country", "vn")],
        }
    }
}

// == Wire Format ==
#[derive(Debug, Deserialize)]
struct GNewsResponse {
    articles: Vec<Article>,
}

// == News Client ==
/// Fetches top headlines for a category key.
pub struct NewsClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl NewsClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            http,
            base_url: parse_base(base_url)?,
            api_key: api_key.into(),
        })
    }

    /// Full request URL for `category`.
    pub fn request_url(&self, category: NewsCategory) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("apikey", &self.api_key)
            .append_pair("lang", "vi")
            .extend_pairs(category.query_params());
        url
    }
}

#[async_trait]
impl Fetch for NewsClient {
    type Output = Vec<Article>;

    async fn fetch(&self, key: &str) -> Result<Vec<Article>, UpstreamError> {
        let url = self.request_url(NewsCategory::from_token(key));
        let response = send(&self.http, &url).await?;
        let body = read_success_body(response, &url).await?;
        let decoded: GNewsResponse = decode_json(&body, &url)?;
        Ok(decoded.articles)
    }
}
