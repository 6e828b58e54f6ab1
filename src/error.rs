// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Application-wide error type, mapped onto HTTP responses in one place.
#[derive(Debug)]
pub enum AppError {
    /// 500. The message is logged; the response body hides it unless the
    /// APP_DEBUG flag is set.
    InternalServerError(String),

    /// 400, e.g. validation failures or malformed payloads.
    BadRequest(String),

    /// 401, missing or invalid credentials.
    AuthError(String),

    /// 403, authenticated but lacking the required role.
    Forbidden(String),

    /// 404.
    NotFound(String),

    /// 409, e.g. a duplicate username or registration number.
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Whether 500 bodies should expose the underlying error detail.
fn debug_responses() -> bool {
    std::env::var("APP_DEBUG")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
}

/// Every error renders as a JSON body `{"error": ...}` with the matching
/// status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                let body = if debug_responses() {
                    msg
                } else {
                    "Internal Server Error".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Lets database failures propagate through `?` as 500s.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
