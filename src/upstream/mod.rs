//! Upstream Module
//!
//! Clients for the third-party providers behind the gateway. Each one turns
//! an internal cache key into a provider request and decodes the answer.
//!
//! # Providers
//! - [`NewsClient`] - GNews top headlines, keyed by category
//! - [`SearchClient`] - TomTom place search, keyed by normalized query
//! - [`TileClient`] - TomTom raster tiles, keyed by `z/x/y`
//! - [`RouteProxy`] - TomTom routing, streamed through uncached
//! - [`ArticleExtractor`] - readable content of an arbitrary article URL

mod article;
mod news;
mod route;
mod search;
mod tiles;

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub use article::{extract_article, ArticleExtractor};
pub use news::{NewsCategory, NewsClient};
pub use route::RouteProxy;
pub use search::{normalize_query, SearchClient};
pub use tiles::TileClient;

// == Fetch Trait ==
/// Keyed fetch against one external provider.
#[async_trait]
pub trait Fetch: Send + Sync {
    type Output: Send;

    async fn fetch(&self, key: &str) -> Result<Self::Output, UpstreamError>;
}

// == Upstream Error ==
/// Why a provider call failed.
///
/// `url` fields are already redacted and safe to log, but none of these
/// details belong in a client-facing response body.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// Connection failure or timeout
    #[error("upstream unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },

    /// Provider answered with a non-success status
    #[error("upstream at {url} rejected the request with status {status}")]
    Rejected {
        url: String,
        status: u16,
        body: String,
    },

    /// Provider answered 2xx with a body we could not parse
    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The request URL could not be built from the key
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),
}

// == HTTP Client ==
/// Builds the shared outbound client with a bounded per-request timeout.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("news_gateway/", env!("CARGO_PKG_VERSION")))
        .build()
}

// == Redaction ==
/// Query parameters that carry provider credentials.
const SECRET_PARAMS: &[&str] = &["key", "apikey", "api_key", "token"];

/// Renders `url` with credential query values masked, for logs and errors.
pub fn redact(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            if SECRET_PARAMS.contains(&name.as_ref()) {
                (name.into_owned(), "***".to_string())
            } else {
                (name.into_owned(), value.into_owned())
            }
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

// == Request Helpers ==
/// Sends a GET and maps transport failures to [`UpstreamError::Unavailable`].
pub(crate) async fn send(
    client: &reqwest::Client,
    url: &Url,
) -> Result<reqwest::Response, UpstreamError> {
    client.get(url.clone()).send().await.map_err(|err| {
        let url = redact(url);
        // reqwest's Display embeds the full URL, key included
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            "request failed".to_string()
        };
        warn!("[UPSTREAM] {} unavailable: {}", url, reason);
        UpstreamError::Unavailable { url, reason }
    })
}

/// Reads a whole response body, failing on any non-success status.
pub(crate) async fn read_success_body(
    response: reqwest::Response,
    url: &Url,
) -> Result<Bytes, UpstreamError> {
    read_success_body_within(response, url, usize::MAX).await
}

/// Like [`read_success_body`], but gives up as soon as the body is known to
/// exceed `limit` bytes, either from `Content-Length` or while streaming.
pub(crate) async fn read_success_body_within(
    mut response: reqwest::Response,
    url: &Url,
    limit: usize,
) -> Result<Bytes, UpstreamError> {
    let status = response.status();

    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large(url, limit));
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response.chunk().await.map_err(|_| {
        let url = redact(url);
        warn!("[UPSTREAM] {} dropped while reading body", url);
        UpstreamError::Unavailable {
            url,
            reason: "body read failed".to_string(),
        }
    })? {
        if body.len().saturating_add(chunk.len()) > limit {
            return Err(too_large(url, limit));
        }
        body.extend_from_slice(&chunk);
    }

    if !status.is_success() {
        let url = redact(url);
        let body = String::from_utf8_lossy(&body).into_owned();
        warn!(
            "[UPSTREAM ERROR] Status: {} | URL: {} | Body: {}",
            status.as_u16(),
            url,
            body
        );
        return Err(UpstreamError::Rejected {
            url,
            status: status.as_u16(),
            body,
        });
    }

    Ok(body.freeze())
}

fn too_large(url: &Url, limit: usize) -> UpstreamError {
    let url = redact(url);
    warn!("[UPSTREAM] {} body exceeds {} bytes", url, limit);
    UpstreamError::Decode {
        url,
        reason: format!("body exceeds {limit} bytes"),
    }
}

/// Parses a JSON body into `T`.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8], url: &Url) -> Result<T, UpstreamError> {
    serde_json::from_slice(body).map_err(|err| {
        let url = redact(url);
        warn!(
            "[UPSTREAM DECODE] URL: {} | Error: {} | Body: {}",
            url,
            err,
            String::from_utf8_lossy(body)
        );
        UpstreamError::Decode {
            url,
            reason: err.to_string(),
        }
    })
}

/// Parses a configured base URL.
pub(crate) fn parse_base(base: &str) -> Result<Url, UpstreamError> {
    Url::parse(base).map_err(|err| UpstreamError::InvalidRequest(format!("{base}: {err}")))
}

/// Appends `segments` to the path of `base`, percent-encoding each one.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, UpstreamError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UpstreamError::InvalidRequest(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
