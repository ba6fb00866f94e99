use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ApiMessage;

/// ApiError
///
/// The write-path error taxonomy. Every variant maps to a user-visible JSON
/// envelope (`{success: false, message}`) plus an HTTP status, so handlers can
/// bubble errors with `?` and still produce the API contract's response shape.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed user input. The message names the offending field.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation, e.g. registering an email twice.
    #[error("{0}")]
    Duplicate(String),

    /// Unknown id on a detail/update/delete path.
    #[error("resource not found")]
    NotFound,

    /// No session, or the session no longer maps to a live account.
    #[error("authentication required")]
    Unauthorized,

    /// Authenticated but not an admin.
    #[error("admin access required")]
    Forbidden,

    /// Database or storage failure that was not recoverable in the handler.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Duplicate(_) => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for the "missing required field" validation error used by the
    /// contact and join intake handlers.
    pub fn missing_field(field: &str) -> Self {
        ApiError::Validation(format!("missing required field: {field}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiMessage {
            success: false,
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
