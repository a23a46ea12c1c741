//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; any [`la_core::Error`]
//! converts with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type. The
/// request id travels in the `x-request-id` response header.
pub struct AppError {
    inner: la_core::Error,
}

impl AppError {
    pub fn new(inner: la_core::Error) -> Self {
        Self { inner }
    }
}

impl From<la_core::Error> for AppError {
    fn from(e: la_core::Error) -> Self {
        Self::new(e)
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        Self::new(la_core::Error::validation(format!("malformed upload: {}", e.body_text())))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let code = match &self.inner {
            la_core::Error::NotFound { .. } => "not_found",
            la_core::Error::Unauthorized(_) => "unauthorized",
            la_core::Error::Forbidden(_) => "forbidden",
            la_core::Error::Validation(_) => "validation_error",
            la_core::Error::Conflict(_) => "conflict",
            la_core::Error::Database { .. } => "database_error",
            la_core::Error::Io { .. } => "io_error",
            la_core::Error::Generation { .. } => "generation_error",
            la_core::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.inner.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
