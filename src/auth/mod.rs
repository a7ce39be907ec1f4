//! Auth Module
//!
//! Bearer-token gate in front of the protected routes. Verification itself is
//! behind [`TokenVerifier`]; production uses [`FirebaseVerifier`].

mod firebase;
mod middleware;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use thiserror::Error;

pub use firebase::{CredentialsError, FirebaseVerifier, JwksClient, ServiceAccount, GOOGLE_JWKS_URL};
pub use middleware::require_auth;

// == Principal ==
/// The verified caller, attached to the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Identity provider user id
    pub uid: String,
    pub email: Option<String>,
}

// == Auth Error ==
/// Why a request was turned away. Every variant maps to 401.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Missing Authorization Header")]
    MissingHeader,

    #[error("Malformed Authorization Header")]
    Malformed,

    /// Bad signature, wrong audience, expired and so on. `reason` is for logs.
    #[error("Invalid or Expired Token")]
    Invalid { reason: String },

    /// The provider's signing keys could not be loaded.
    #[error("Invalid or Expired Token")]
    KeysUnavailable { reason: String },
}

impl AuthError {
    pub(crate) fn invalid(reason: impl ToString) -> Self {
        AuthError::Invalid {
            reason: reason.to_string(),
        }
    }
}

// == Token Verifier ==
/// Verifies an identity token and names its holder.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError>;
}

// == Bearer Extraction ==
/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token)
}

// == Authorize ==
/// Runs the whole gate: extract the bearer credential, then verify it.
pub async fn authorize(
    headers: &HeaderMap,
    verifier: &dyn TokenVerifier,
) -> Result<Principal, AuthError> {
    let token = bearer_token(headers)?;
    verifier.verify(token).await
}
