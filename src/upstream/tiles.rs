//! TomTom raster tile client

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::upstream::{join_segments, parse_base, read_success_body, send, Fetch, UpstreamError};

// == Tile Client ==
/// Fetches 512px PNG tiles keyed by `"z/x/y"`.
pub struct TileClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl TileClient {
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

    /// Full request URL for a `"z/x/y"` key.
    pub fn request_url(&self, key: &str) -> Result<Url, UpstreamError> {
        let parts: Vec<&str> = key.split('/').collect();
        let [z, x, y] = parts.as_slice() else {
            return Err(UpstreamError::InvalidRequest(format!(
                "tile key must be z/x/y, got {key}"
            )));
        };

        let file = format!("{y}.png");
        let mut url = join_segments(&self.base_url, &[*z, *x, file.as_str()])?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("tileSize", "512")
            .append_pair("view", "Unified")
            .append_pair("language", "vi-VN");
        Ok(url)
    }
}

#[async_trait]
impl Fetch for TileClient {
    type Output = Bytes;

    async fn fetch(&self, key: &str) -> Result<Bytes, UpstreamError> {
        let url = self.request_url(key)?;
        let response = send(&self.http, &url).await?;
        read_success_body(response, &url).await
    }
}
