//! Unified application error model and HTTP mapping.
//! Every handler-level failure is converted to one of these kinds before it
//! reaches the client; upstream detail never leaves the process in a body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Malformed or missing input.
    #[error("{code}: {message}")]
    Validation { code: String, message: String },
    /// Bad credentials. The message must not reveal which field was wrong.
    #[error("{code}: {message}")]
    Authentication { code: String, message: String },
    /// Missing or invalid session on a protected route.
    #[error("{code}: {message}")]
    Authorization { code: String, message: String },
    /// Unknown identifier.
    #[error("{code}: {message}")]
    NotFound { code: String, message: String },
    /// Stale session; the caller is treated as unauthenticated.
    #[error("{code}: {message}")]
    Session { code: String, message: String },
    /// Persistence or federation collaborator failure. Logged; callers see a
    /// generic message only.
    #[error("{code}: {message}")]
    Upstream { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Validation { code, .. }
            | AppError::Authentication { code, .. }
            | AppError::Authorization { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Session { code, .. }
            | AppError::Upstream { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::Authentication { message, .. }
            | AppError::Authorization { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Session { message, .. }
            | AppError::Upstream { message, .. } => message.as_str(),
        }
    }

    pub fn validation<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        AppError::Validation { code: code.into(), message: msg.into() }
    }
    pub fn authentication<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        AppError::Authentication { code: code.into(), message: msg.into() }
    }
    pub fn authorization<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        AppError::Authorization { code: code.into(), message: msg.into() }
    }
    pub fn not_found<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        AppError::NotFound { code: code.into(), message: msg.into() }
    }
    pub fn session<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        AppError::Session { code: code.into(), message: msg.into() }
    }
    pub fn upstream<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        AppError::Upstream { code: code.into(), message: msg.into() }
    }

    /// Map to HTTP status code. A stale session is unauthenticated, not a
    /// server fault.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 400,
            AppError::Authentication { .. } => 401,
            AppError::Authorization { .. } => 401,
            AppError::NotFound { .. } => 404,
            AppError::Session { .. } => 401,
            AppError::Upstream { .. } => 500,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    // Store and collaborator internals report through anyhow; anything that
    // escapes unmapped is an upstream fault.
    fn from(err: anyhow::Error) -> Self {
        AppError::Upstream { code: "upstream_error".into(), message: err.to_string() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &self {
            AppError::Upstream { message, .. } => {
                error!("upstream failure: {}", message);
                "internal server error"
            }
            _ => self.message(),
        };
        let body = json!({
            "status": "error",
            "code": self.code_str(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}
