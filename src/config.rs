//! Configuration Module
//!
//! Handles loading gateway configuration from environment variables.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{CredentialsError, ServiceAccount, GOOGLE_JWKS_URL};

pub const DEFAULT_GNEWS_BASE_URL: &str = "https://gnews.io/api/v4/top-headlines";
pub const DEFAULT_TOMTOM_SEARCH_URL: &str = "https://api.tomtom.com/search/2/search";
pub const DEFAULT_TOMTOM_TILE_URL: &str = "https://api.tomtom.com/map/1/tile/basic/main";
pub const DEFAULT_TOMTOM_ROUTE_URL: &str = "https://api.tomtom.com/routing/1/calculateRoute";

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Provider keys default to empty, in which case the provider answers 401/403
/// and the gateway relays that as an upstream failure.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Service account JSON, inline
    pub firebase_credentials: Option<String>,
    /// Service account JSON file, read when no inline credential is set
    pub firebase_credentials_file: PathBuf,
    /// Where the identity provider publishes its signing keys
    pub jwks_url: String,
    pub gnews_api_key: String,
    pub tomtom_api_key: String,
    pub gnews_base_url: String,
    pub tomtom_search_url: String,
    pub tomtom_tile_url: String,
    pub tomtom_route_url: String,
    /// Per-request timeout for every outbound provider call
    pub upstream_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 8080)
    /// - `FIREBASE_CREDENTIALS` - Service account JSON blob
    /// - `FIREBASE_CREDENTIALS_FILE` - Fallback credential file (default: serviceAccountKey.json)
    /// - `GNEWS_API_KEY`, `TOMTOM_API_KEY` - Provider keys (default: empty)
    /// - `GNEWS_BASE_URL`, `TOMTOM_SEARCH_URL`, `TOMTOM_TILE_URL`, `TOMTOM_ROUTE_URL` - Provider endpoints
    /// - `UPSTREAM_TIMEOUT_SECS` - Outbound request timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_parsed("PORT").unwrap_or(defaults.server_port),
            firebase_credentials: env_string("FIREBASE_CREDENTIALS"),
            firebase_credentials_file: env_string("FIREBASE_CREDENTIALS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.firebase_credentials_file),
            jwks_url: defaults.jwks_url,
            gnews_api_key: env_string("GNEWS_API_KEY").unwrap_or_default(),
            tomtom_api_key: env_string("TOMTOM_API_KEY").unwrap_or_default(),
            gnews_base_url: env_string("GNEWS_BASE_URL").unwrap_or(defaults.gnews_base_url),
            tomtom_search_url: env_string("TOMTOM_SEARCH_URL")
                .unwrap_or(defaults.tomtom_search_url),
            tomtom_tile_url: env_string("TOMTOM_TILE_URL").unwrap_or(defaults.tomtom_tile_url),
            tomtom_route_url: env_string("TOMTOM_ROUTE_URL").unwrap_or(defaults.tomtom_route_url),
            upstream_timeout: env_parsed::<u64>("UPSTREAM_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.upstream_timeout),
        }
    }

    /// Loads the identity-provider service account.
    ///
    /// The inline blob wins; otherwise the credential file is read.
    pub fn service_account(&self) -> Result<ServiceAccount, CredentialsError> {
        if let Some(blob) = &self.firebase_credentials {
            return ServiceAccount::from_json(blob);
        }

        let path = &self.firebase_credentials_file;
        let blob = fs::read_to_string(path).map_err(|source| CredentialsError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        ServiceAccount::from_json(&blob)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            firebase_credentials: None,
            firebase_credentials_file: PathBuf::from("serviceAccountKey.json"),
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            gnews_api_key: String::new(),
            tomtom_api_key: String::new(),
            gnews_base_url: DEFAULT_GNEWS_BASE_URL.to_string(),
            tomtom_search_url: DEFAULT_TOMTOM_SEARCH_URL.to_string(),
            tomtom_tile_url: DEFAULT_TOMTOM_TILE_URL.to_string(),
            tomtom_route_url: DEFAULT_TOMTOM_ROUTE_URL.to_string(),
            upstream_timeout: Duration::from_secs(30),
        }
    }
}

/// Reads a variable, treating an empty value as unset.
fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.trim().parse().ok())
}
