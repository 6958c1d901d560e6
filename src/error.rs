// SPDX-License-Identifier: MIT

//! Typed error handling for college-db
//!
//! Every layer (store, services, assistant, HTTP) returns [`AppError`]. The
//! HTTP boundary maps each variant to a status code and renders the message
//! as `{"detail": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Top-level error type for college-db
#[derive(Debug, Error)]
pub enum AppError {
    /// Requested entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Input failed validation (bad WKT, unknown enum value, short password, ...)
    #[error("{0}")]
    Validation(String),

    /// Missing, expired or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (non-admin on an admin operation, non-author)
    #[error("{0}")]
    Forbidden(String),

    /// Uniqueness violation or an illegal state transition
    #[error("{0}")]
    Conflict(String),

    /// Configuration errors (missing keys, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// SQLite errors
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// Errors reported by an upstream service (AMap, the LLM endpoint)
    #[error("Upstream error from {provider}: {message}")]
    Upstream { provider: String, message: String },

    /// Agent loop ran out of turns
    #[error("Max turns reached: {0}")]
    MaxTurns(u32),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an upstream error
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream { .. } | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_)
            | Self::Database(_)
            | Self::MaxTurns(_)
            | Self::Io(_)
            | Self::Yaml(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => Self::Conflict(err.to_string()),
            _ => Self::Database(err),
        }
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("request failed: {}", self);
        } else {
            log::debug!("request rejected ({}): {}", status, self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
