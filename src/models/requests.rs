//! Request DTOs for the gateway API
//!
//! Query strings for each route. Every field is optional at the
//! deserialization level so a missing parameter becomes a plain-text 400
//! from the handler rather than an extractor rejection.

use serde::Deserialize;
use url::Url;

use crate::upstream::{normalize_query, NewsCategory, RouteProxy};

/// Deepest zoom level the tile provider serves.
pub const MAX_ZOOM: u32 = 22;

/// Query for `GET /news`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsQuery {
    pub category: Option<String>,
}

impl NewsQuery {
    /// Missing or unknown categories fall back to general news.
    pub fn category(&self) -> NewsCategory {
        self.category
            .as_deref()
            .map(NewsCategory::from_token)
            .unwrap_or(NewsCategory::General)
    }
}

/// Query for `GET /article`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleQuery {
    pub url: Option<String>,
}

impl ArticleQuery {
    /// Returns the article URL, which must be absolute http(s).
    pub fn target(&self) -> Result<Url, String> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| "Missing URL parameter".to_string())?;

        let url = Url::parse(raw).map_err(|_| "Invalid URL parameter".to_string())?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err("URL must use http or https".to_string()),
        }
    }
}

/// Query for `GET /travel/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    /// Returns the normalized query, which doubles as the cache key.
    pub fn cache_key(&self) -> Result<String, String> {
        self.q
            .as_deref()
            .map(normalize_query)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| "Missing query parameter".to_string())
    }
}

/// Query for `GET /tiles`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TileQuery {
    pub z: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
}

impl TileQuery {
    /// Returns the `"z/x/y"` cache key after checking the tile exists.
    pub fn cache_key(&self) -> Result<String, String> {
        let (Some(z), Some(x), Some(y)) = (
            non_empty(&self.z),
            non_empty(&self.x),
            non_empty(&self.y),
        ) else {
            return Err("Missing z, x, y parameters".to_string());
        };

        let parse = |value: &str| value.parse::<u32>().ok();
        let (Some(z), Some(x), Some(y)) = (parse(z), parse(x), parse(y)) else {
            return Err("z, x, y must be non-negative integers".to_string());
        };

        if z > MAX_ZOOM {
            return Err(format!("z must be at most {MAX_ZOOM}"));
        }
        let side = 1u64 << z;
        if u64::from(x) >= side || u64::from(y) >= side {
            return Err(format!("x and y must be below {side} at zoom {z}"));
        }

        Ok(format!("{z}/{x}/{y}"))
    }
}

/// Query for `GET /travel/route`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteQuery {
    pub points: Option<String>,
}

impl RouteQuery {
    /// Returns the `start:end` points string.
    pub fn points(&self) -> Result<&str, String> {
        let points = non_empty(&self.points)
            .ok_or_else(|| "Missing points parameter (start:end)".to_string())?;
        if !RouteProxy::is_valid_points(points) {
            return Err("points must look like lat,lon:lat,lon".to_string());
        }
        Ok(points)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
