//! TomTom place search client

use async_trait::async_trait;
use url::Url;

use crate::models::SearchResults;
use crate::upstream::{
    decode_json, join_segments, parse_base, read_success_body, send, Fetch, UpstreamError,
};

/// Results requested per query.
const RESULT_LIMIT: &str = "5";

// == Query Normalization ==
/// Canonical form of a search query, used as its cache key.
///
/// Trims, collapses runs of whitespace to one space and lowercases, so that
/// `" Hồ  Gươm"` and `"hồ gươm"` share one entry.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// == Search Client ==
/// Geocodes free text, restricted to Vietnam.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl SearchClient {
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

    /// Full request URL; the query becomes a percent-encoded path segment.
    pub fn request_url(&self, query: &str) -> Result<Url, UpstreamError> {
        let file = format!("{query}.json");
        let mut url = join_segments(&self.base_url, &[file.as_str()])?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("countrySet", "VN")
            .append_pair("limit", RESULT_LIMIT)
            .append_pair("language", "vi-VN");
        Ok(url)
    }
}

#[async_trait]
impl Fetch for SearchClient {
    type Output = SearchResults;

    async fn fetch(&self, key: &str) -> Result<SearchResults, UpstreamError> {
        let url = self.request_url(key)?;
        let response = send(&self.http, &url).await?;
        let body = read_success_body(response, &url).await?;
        decode_json(&body, &url)
    }
}
