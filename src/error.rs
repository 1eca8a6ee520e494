// src/error.rs
//! Request-level error type and its HTTP mapping.
//!
//! Client mistakes come back as 400 with the validation message. Upstream and
//! internal failures are logged in full, but the caller only gets a short
//! generic detail so that provider bodies and keys never reach the browser.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::message::ErrorBody;

/// The external service an upstream call was made to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Embeddings,
    VectorIndex,
    Completion,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Service::Embeddings => "embedding",
            Service::VectorIndex => "vector index",
            Service::Completion => "completion",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} service returned {status}: {body}")]
    Status {
        service: Service,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{service} service sent an unusable response: {reason}")]
    Malformed { service: Service, reason: String },
}

impl UpstreamError {
    pub fn transport(service: Service, source: reqwest::Error) -> Self {
        Self::Transport { service, source }
    }

    pub fn malformed(service: Service, reason: impl Into<String>) -> Self {
        Self::Malformed { service, reason: reason.into() }
    }

    pub fn service(&self) -> Service {
        match self {
            Self::Transport { service, .. }
            | Self::Status { service, .. }
            | Self::Malformed { service, .. } => *service,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upstream(e) => {
                error!(error = %e, service = %e.service(), "upstream call failed");
                (StatusCode::BAD_GATEWAY, format!("{} service error", e.service()))
            }
            AppError::Internal(msg) => {
                error!(message = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
