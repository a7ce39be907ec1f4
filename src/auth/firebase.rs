//! Firebase ID token verification
//!
//! Tokens are RS256 JWTs signed by Google. The public keys are published as
//! a JWKS document and cached through the same cache-aside resolver as the
//! provider payloads.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::auth::{AuthError, Principal, TokenVerifier};
use crate::cache::CacheAside;
use crate::upstream::{decode_json, read_success_body, send, Fetch, UpstreamError};

/// Where Google publishes the keys that sign Firebase ID tokens.
pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

// == Service Account ==
/// The parts of a Firebase service account credential the gateway needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
}

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("credential JSON is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("credential has an empty project_id")]
    MissingProjectId,

    #[error("cannot read credential file {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },
}

impl ServiceAccount {
    /// Parses a service account JSON blob.
    pub fn from_json(blob: &str) -> Result<Self, CredentialsError> {
        let account: ServiceAccount = serde_json::from_str(blob)?;
        if account.project_id.trim().is_empty() {
            return Err(CredentialsError::MissingProjectId);
        }
        Ok(account)
    }
}

// == JWKS Client ==
/// Fetches a JWKS document keyed by its URL.
pub struct JwksClient {
    http: reqwest::Client,
}

impl JwksClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetch for JwksClient {
    type Output = JwkSet;

    async fn fetch(&self, key: &str) -> Result<JwkSet, UpstreamError> {
        let url = Url::parse(key).map_err(|err| UpstreamError::InvalidRequest(err.to_string()))?;
        let response = send(&self.http, &url).await?;
        let body = read_success_body(response, &url).await?;
        decode_json(&body, &url)
    }
}

// == Claims ==
#[derive(Debug, Clone, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

// == Firebase Verifier ==
pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    keys: Arc<CacheAside<JwkSet>>,
}

impl FirebaseVerifier {
    /// `keys` resolves `jwks_url` to the current signing key set.
    pub fn new(
        account: &ServiceAccount,
        jwks_url: impl Into<String>,
        keys: Arc<CacheAside<JwkSet>>,
    ) -> Self {
        Self {
            project_id: account.project_id.clone(),
            jwks_url: jwks_url.into(),
            keys,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[format!("{ISSUER_PREFIX}{}", self.project_id)]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation
    }
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let header = decode_header(token).map_err(AuthError::invalid)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::invalid(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::invalid("token header has no kid"))?;

        let key_set = self
            .keys
            .resolve(&self.jwks_url)
            .await
            .map_err(|err| AuthError::KeysUnavailable {
                reason: err.to_string(),
            })?;
        let jwk = key_set
            .find(&kid)
            .ok_or_else(|| AuthError::invalid(format!("unknown key id {kid}")))?;
        let key = DecodingKey::from_jwk(jwk).map_err(AuthError::invalid)?;

        let data = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(AuthError::invalid)?;
        if data.claims.sub.is_empty() {
            return Err(AuthError::invalid("empty subject"));
        }

        Ok(Principal {
            uid: data.claims.sub,
            email: data.claims.email,
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{TtlStore, WithTtl, SIGNING_KEYS_TTL};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    const TEST_KEY_PEM: &str = include_str!("../../tests/fixtures/test_rsa_key.pem");
    const TEST_JWKS: &str = include_str!("../../tests/fixtures/test_jwks.json");
    const PROJECT: &str = "pinggo-test";

    struct StaticKeys;

    #[async_trait]
    impl Fetch for StaticKeys {
        type Output = JwkSet;

        async fn fetch(&self, _key: &str) -> Result<JwkSet, UpstreamError> {
            Ok(serde_json::from_str(TEST_JWKS).unwrap())
        }
    }

    struct NoKeys;

    #[async_trait]
    impl Fetch for NoKeys {
        type Output = JwkSet;

        async fn fetch(&self, key: &str) -> Result<JwkSet, UpstreamError> {
            Err(UpstreamError::Unavailable {
                url: key.to_string(),
                reason: "connection failed".to_string(),
            })
        }
    }

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        aud: &'a str,
        iss: String,
        exp: i64,
        email: &'a str,
    }

    fn verifier_with(upstream: Arc<dyn Fetch<Output = JwkSet>>) -> FirebaseVerifier {
        let store: Arc<TtlStore<JwkSet>> = Arc::new(TtlStore::new());
        let keys = Arc::new(CacheAside::<JwkSet>::new(
            "signing_keys",
            Arc::new(WithTtl::new(store, SIGNING_KEYS_TTL)),
            upstream,
        ));
        let account = ServiceAccount::from_json(&format!(r#"{{"project_id":"{PROJECT}"}}"#)).unwrap();
        FirebaseVerifier::new(&account, GOOGLE_JWKS_URL, keys)
    }

    fn sign(kid: &str, aud: &str, exp_offset: i64) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let claims = TestClaims {
            sub: "uid-42",
            aud,
            iss: format!("{ISSUER_PREFIX}{aud}"),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            email: "a@example.vn",
        };
        let key = EncodingKey::from_rsa_pem(TEST_KEY_PEM.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    #[test]
    fn test_service_account_parse() {
        let account = ServiceAccount::from_json(
            r#"{"type":"service_account","project_id":"p1","client_email":"x@p1.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        assert_eq!(account.project_id, "p1");
    }

    #[test]
    fn test_service_account_rejects_bad_blob() {
        assert!(matches!(
            ServiceAccount::from_json("{not json"),
            Err(CredentialsError::Malformed(_))
        ));
        assert!(matches!(
            ServiceAccount::from_json(r#"{"project_id":"  "}"#),
            Err(CredentialsError::MissingProjectId)
        ));
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let verifier = verifier_with(Arc::new(StaticKeys));

        let principal = verifier.verify(&sign("test-key-1", PROJECT, 3600)).await.unwrap();

        assert_eq!(principal.uid, "uid-42");
        assert_eq!(principal.email.as_deref(), Some("a@example.vn"));
        assert_eq!(verifier.project_id, PROJECT);
    }

    #[tokio::test]
    async fn test_signing_keys_are_cached() {
        let verifier = verifier_with(Arc::new(StaticKeys));
        let token = sign("test-key-1", PROJECT, 3600);

        verifier.verify(&token).await.unwrap();
        verifier.verify(&token).await.unwrap();

        let stats = verifier.keys.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_audience() {
        let verifier = verifier_with(Arc::new(StaticKeys));

        let err = verifier
            .verify(&sign("test-key-1", "someone-else", 3600))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_verify_rejects_expired() {
        let verifier = verifier_with(Arc::new(StaticKeys));

        let err = verifier
            .verify(&sign("test-key-1", PROJECT, -3600))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_verify_rejects_unknown_kid() {
        let verifier = verifier_with(Arc::new(StaticKeys));

        let err = verifier
            .verify(&sign("rotated-away", PROJECT, 3600))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage() {
        let verifier = verifier_with(Arc::new(StaticKeys));
        let err = verifier.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_verify_keys_unavailable() {
        let verifier = verifier_with(Arc::new(NoKeys));

        let err = verifier
            .verify(&sign("test-key-1", PROJECT, 3600))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::KeysUnavailable { .. }));
    }
}
