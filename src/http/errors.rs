//! Error-to-HTTP mapping.
//!
//! Three classes reach the client:
//! - client errors: the canonical reason phrase for a 4xx status
//! - server errors: logged with a stack trace, surfaced as a bare 500
//! - recovered panics: converted to server errors by the recovery step
//!
//! No internal detail is ever written to the response body.

use std::backtrace::Backtrace;
use std::fmt;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::models::ModelError;
use crate::session::SessionError;
use crate::templates::TemplateError;

/// Application error returned by handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No such resource. Rendered through the client-error path.
    #[error("not found")]
    NotFound,

    /// Rejected request (bad input, failed CSRF check, ...).
    #[error("client error: {0}")]
    Client(StatusCode),

    /// Anything the client cannot fix.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// A server-side failure with the stack captured where it was raised.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ServerError {
    message: String,
    trace: String,
}

impl ServerError {
    pub fn new(err: impl fmt::Display) -> Self {
        Self {
            message: err.to_string(),
            trace: Backtrace::force_capture().to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> &str {
        &self.trace
    }
}

impl AppError {
    pub fn server(err: impl fmt::Display) -> Self {
        Self::Server(ServerError::new(err))
    }
}

impl From<TemplateError> for AppError {
    fn from(err: TemplateError) -> Self {
        Self::server(err)
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        Self::server(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self::server(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => client_error(StatusCode::NOT_FOUND),
            Self::Client(status) => client_error(status),
            Self::Server(err) => {
                tracing::error!(error = %err.message, backtrace = %err.trace, "server error");
                plain_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

/// Response for a rejected request.
pub fn client_error(status: StatusCode) -> Response {
    plain_status(status)
}

/// Body is the reason phrase, like `http.Error` in classic servers.
pub fn plain_status(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        format!("{reason}\n"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn not_found_uses_client_error_path() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Not Found\n");
    }

    #[tokio::test]
    async fn server_error_hides_detail() {
        let response = AppError::server("db password is hunter2").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error\n");
    }

    #[test]
    fn server_error_captures_trace() {
        let err = ServerError::new("boom");
        assert_eq!(err.message(), "boom");
        assert!(!err.trace().is_empty());
    }
}
