//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing JSON bodies that the gateway builds
//! itself rather than relaying from a provider.

use serde::Serialize;

use crate::cache::CacheStats;

/// Readable content of an article page (GET /article)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleContent {
    /// Headline
    pub title: String,
    /// Body as sanitized `<p>` markup
    pub content: String,
    /// Body as plain text, paragraphs separated by blank lines
    pub text_content: String,
    /// Publisher name
    pub site_name: String,
}

/// Per-store cache statistics (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub news: CacheStats,
    pub search: CacheStats,
    pub tiles: CacheStats,
    pub signing_keys: CacheStats,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
