//! TomTom routing pass-through
//!
//! Routes depend on live traffic, so they are proxied on every request and
//! never cached.

use tracing::info;
use url::Url;

use crate::upstream::{join_segments, parse_base, redact, send, UpstreamError};

// == Route Proxy ==
pub struct RouteProxy {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl RouteProxy {
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

    /// Checks the `"lat,lon:lat,lon"` shape before it is spliced into a URL path.
    pub fn is_valid_points(points: &str) -> bool {
        let legs: Vec<&str> = points.split(':').collect();
        legs.len() >= 2
            && legs.iter().all(|leg| {
                !leg.is_empty()
                    && leg
                        .chars()
                        .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
            })
    }

    pub fn request_url(&self, points: &str) -> Result<Url, UpstreamError> {
        let mut url = join_segments(&self.base_url, &[points, "json"])?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("traffic", "true");
        Ok(url)
    }

    // == Open ==
    /// Starts the upstream request and hands back the unread response.
    ///
    /// The status and body are the caller's to forward; only transport
    /// failures are errors here.
    pub async fn open(&self, points: &str) -> Result<reqwest::Response, UpstreamError> {
        let url = self.request_url(points)?;
        info!("[ROUTE API] {}", redact(&url));
        send(&self.http, &url).await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_points() {
        assert!(RouteProxy::is_valid_points("10.77,106.69:10.80,106.70"));
        assert!(RouteProxy::is_valid_points("-1.5,2:3,4:5,6"));
    }

    #[test]
    fn test_invalid_points() {
        assert!(!RouteProxy::is_valid_points("10.77,106.69"));
        assert!(!RouteProxy::is_valid_points("10.77,106.69:"));
        assert!(!RouteProxy::is_valid_points(":10.80,106.70"));
        assert!(!RouteProxy::is_valid_points("a:b"));
        assert!(!RouteProxy::is_valid_points("1,2:../../admin"));
    }

    #[test]
    fn test_request_url() {
        let proxy = RouteProxy::new(
            reqwest::Client::new(),
            "https://api.tomtom.com/routing/1/calculateRoute",
            "k",
        )
        .unwrap();

        let url = proxy.request_url("10.77,106.69:10.80,106.70").unwrap();

        assert_eq!(
            url.path(),
            "/routing/1/calculateRoute/10.77,106.69:10.80,106.70/json"
        );
        assert!(url.query().unwrap().contains("traffic=true"));
    }
}
