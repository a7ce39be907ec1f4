//! Auth middleware for the protected routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::auth::{authorize, TokenVerifier};
use crate::error::AppError;

/// Rejects requests without a valid bearer token with 401.
///
/// Preflight requests pass straight through. On success the verified
/// [`Principal`](crate::auth::Principal) is added to the request extensions.
pub async fn require_auth(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    match authorize(request.headers(), verifier.as_ref()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => {
            warn!(
                "[AUTH] {} {} rejected: {:?}",
                request.method(),
                request.uri().path(),
                err
            );
            AppError::from(err).into_response()
        }
    }
}
