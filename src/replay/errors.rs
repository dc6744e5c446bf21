//! # Replay Errors
//!
//! Not-configured, unknown-route and security rejection all reach the
//! client as an empty 404, but stay separate variants so logs and callers
//! can tell a forged token from a mistyped path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::capability::CapabilityError;
use crate::executor::ExecutorError;
use crate::render::RenderError;

/// Result type for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Replay dispatcher errors
#[derive(Debug, Error)]
pub enum ReplayError {
    // ==================
    // Not found (404)
    // ==================
    /// No secret key provisioned; the subsystem is dark
    #[error("Replay is not configured")]
    NotConfigured,

    /// Path does not name a replay operation
    #[error("Unknown replay route: {0}")]
    UnknownRoute(String),

    // ==================
    // Security
    // ==================
    /// Presented token does not authorize this statement
    #[error("Capability token rejected")]
    SecurityRejected,

    /// Token could not be computed
    #[error("{0}")]
    Capability(CapabilityError),

    // ==================
    // Client errors
    // ==================
    /// Request parameters unusable
    #[error("Malformed replay request: {0}")]
    MalformedRequest(String),

    // ==================
    // Collaborator failures
    // ==================
    /// Database failure, passed through unchanged
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// View could not be rendered
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<CapabilityError> for ReplayError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::TokenMismatch => ReplayError::SecurityRejected,
            other => ReplayError::Capability(other),
        }
    }
}

impl ReplayError {
    /// Stable name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ReplayError::NotConfigured => "not_configured",
            ReplayError::UnknownRoute(_) => "unknown_route",
            ReplayError::SecurityRejected => "security_rejected",
            ReplayError::Capability(_) => "capability",
            ReplayError::MalformedRequest(_) => "malformed_request",
            ReplayError::Executor(_) => "executor",
            ReplayError::Render(_) => "render",
        }
    }

    /// Whether the client only sees an empty not-found
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReplayError::NotConfigured | ReplayError::UnknownRoute(_) | ReplayError::SecurityRejected
        )
    }

    /// Machine-readable code for the JSON error body; database failures
    /// keep the executor's own code
    pub fn error_code(&self) -> &'static str {
        match self {
            ReplayError::Executor(err) => err.code(),
            ReplayError::Render(_) => "REPLAY_RENDER",
            ReplayError::Capability(_) => "REPLAY_CAPABILITY",
            ReplayError::MalformedRequest(_) => "REPLAY_MALFORMED",
            ReplayError::NotConfigured
            | ReplayError::UnknownRoute(_)
            | ReplayError::SecurityRejected => "REPLAY_NOT_FOUND",
        }
    }

    pub fn is_security_rejection(&self) -> bool {
        matches!(self, ReplayError::SecurityRejected)
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReplayError::NotConfigured
            | ReplayError::UnknownRoute(_)
            | ReplayError::SecurityRejected => StatusCode::NOT_FOUND,
            ReplayError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ReplayError::Capability(_)
            | ReplayError::Executor(_)
            | ReplayError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub error_code: &'static str,
}

impl IntoResponse for ReplayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_not_found() {
            return status.into_response();
        }
        let body = Json(ErrorResponse {
            code: status.as_u16(),
            error_code: self.error_code(),
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
