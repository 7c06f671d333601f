//! # HTTP Errors
//!
//! Every failure leaving the control plane, whether raised by a handler, the
//! bouncer or a proxy, is rendered as
//!
//! ```json
//! {"error": {"code": "FORBIDDEN", "message": "Access denied to endpoint"}}
//! ```
//!
//! Collaborator, token and proxy errors convert into [`AppError`] with `?`.
//! Internal failures are logged and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dockm_core::{ServiceError, TokenError};
use serde::Serialize;
use thiserror::Error;

use crate::proxy::ProxyError;

/// Client-visible error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// The error payload.
    pub error: ErrorDetail,
}

/// Code, message and optional structured details of an error.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Stable machine-readable code, e.g. `ACCESS_DENIED`.
    pub code: String,
    /// Message shown to the caller.
    pub message: String,
    /// Extra context for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    /// An envelope with no details.
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Failure of a control-plane request. The payload is the caller-facing
/// message, except for [`AppError::Internal`].
#[derive(Error, Debug)]
pub enum AppError {
    /// No such endpoint, resource control or record.
    #[error("{0}")]
    NotFound(String),

    /// Well-formed request that breaks a business rule.
    #[error("{0}")]
    Validation(String),

    /// Unparseable body or path parameter.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, malformed, forged or expired credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the role, endpoint authorization or ownership check failed.
    #[error("{0}")]
    Forbidden(String),

    /// A unique key is already taken.
    #[error("{0}")]
    Conflict(String),

    /// The engine could not be reached.
    #[error("{0}")]
    BadGateway(String),

    /// Anything else. Logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::BadGateway(_) => (StatusCode::BAD_GATEWAY, "ENGINE_UNREACHABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "An internal error occurred".to_string()
            }
            Self::BadGateway(detail) => {
                tracing::warn!(error = %detail, "engine unreachable");
                detail
            }
            Self::NotFound(m)
            | Self::Validation(m)
            | Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::Conflict(m) => m,
        };
        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::NotFound { .. } => Self::NotFound(message),
            ServiceError::AlreadyExists { .. } => Self::Conflict(message),
            ServiceError::Unavailable(_) => Self::Internal(message),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::Unauthorized("token expired".into()),
            TokenError::Invalid(_) => Self::Unauthorized("invalid token".into()),
            TokenError::Signing(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ProxyError> for AppError {
    fn from(err: ProxyError) -> Self {
        let message = err.to_string();
        match err {
            ProxyError::Transport(_) => Self::BadGateway(message),
            ProxyError::UnsupportedEndpoint(_) | ProxyError::Path(_) => {
                Self::BadRequest(message)
            }
            ProxyError::Tls(_) | ProxyError::Shape(_) | ProxyError::Service(_) => {
                Self::Internal(message)
            }
        }
    }
}
