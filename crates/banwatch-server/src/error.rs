//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Request-level failures, each mapped to a JSON error body
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} required")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("unknown endpoint")]
    UnknownEndpoint,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("remote rejected insert")]
    RemoteRejected { status: u16, body: String },

    #[error("save failed")]
    SaveFailed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BodyRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UnknownEndpoint => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RemoteRejected { .. } => StatusCode::BAD_GATEWAY,
            ApiError::SaveFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::RemoteRejected { status, body } => json!({
                "error": self.to_string(),
                "status": status,
                "body": body,
            }),
            ApiError::SaveFailed(details) => json!({
                "error": self.to_string(),
                "details": details,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Failures of the remote insert call
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("remote error {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<MirrorError> for ApiError {
    fn from(err: MirrorError) -> Self {
        match err {
            MirrorError::Rejected { status, body } => ApiError::RemoteRejected { status, body },
            other => ApiError::SaveFailed(other.to_string()),
        }
    }
}

impl From<MirrorError> for ServerError {
    fn from(err: MirrorError) -> Self {
        match err {
            MirrorError::Transport(e) => ServerError::Client(e),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

/// Startup and serve failures
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
