//! Error types for the gateway
//!
//! Every handler failure funnels into [`AppError`], which decides the status
//! code and the plain-text body the client sees. Provider details stay in
//! the logs.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::upstream::UpstreamError;

// == App Error Enum ==
/// Unified error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed request parameter
    #[error("{0}")]
    Validation(String),

    /// Caller could not be authenticated
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A provider call failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A provider rejection relayed with its own status and body
    #[error("{body}")]
    Forwarded { status: u16, body: String },
}

impl AppError {
    /// Relays a tile rejection as-is; other failures keep their usual mapping.
    pub fn forward_rejection(err: UpstreamError, provider: &str) -> Self {
        match err {
            UpstreamError::Rejected { status, body, .. } => AppError::Forwarded {
                status,
                body: format!("{provider} Error ({status}): {body}"),
            },
            other => AppError::Upstream(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Upstream(UpstreamError::Unavailable { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Forwarded { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Auth(err) => err.to_string(),
            AppError::Upstream(UpstreamError::Unavailable { .. }) => {
                "Upstream service unavailable".to_string()
            }
            AppError::Upstream(_) => "Internal Server Error".to_string(),
            AppError::Forwarded { body, .. } => body.clone(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.client_message(),
        )
            .into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
