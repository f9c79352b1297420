//! Anti-forgery tokens bound to the session.
//!
//! Safe requests get a token issued (or reused) and exposed as [`CsrfToken`].
//! Unsafe requests must echo the session's token back, either in the
//! `csrf_token` form field or the `X-CSRF-Token` header.

use axum::body::{to_bytes, Body};
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderName, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::LengthLimitError;

use crate::http::errors::AppError;
use crate::session::{generate_token, keys, Session};

pub const FORM_FIELD: &str = "csrf_token";
pub const HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

pub const MAX_FORM_BYTES: usize = 1024 * 1024;

/// The current request's anti-forgery token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

impl<S> FromRequestParts<S> for CsrfToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CsrfToken>()
            .cloned()
            .unwrap_or(CsrfToken(String::new())))
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

pub async fn csrf_protect(mut request: Request, next: Next) -> Result<Response, AppError> {
    let session = Session::from_extensions(request.extensions())?;

    let token = match session.get_string(keys::CSRF_TOKEN).await? {
        Some(token) => token,
        None => {
            let token = generate_token();
            session.put_string(keys::CSRF_TOKEN, token.clone()).await?;
            token
        }
    };
    request.extensions_mut().insert(CsrfToken(token.clone()));

    if is_safe(request.method()) {
        return Ok(next.run(request).await);
    }

    let header_token = request
        .headers()
        .get(HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let (request, submitted) = match header_token {
        Some(submitted) => (request, Some(submitted)),
        None => {
            let (parts, body) = request.into_parts();
            let bytes = to_bytes(body, MAX_FORM_BYTES).await.map_err(body_error)?;
            let submitted = if is_form(&parts) {
                url::form_urlencoded::parse(&bytes)
                    .find(|(key, _)| key == FORM_FIELD)
                    .map(|(_, value)| value.into_owned())
            } else {
                None
            };
            (Request::from_parts(parts, Body::from(bytes)), submitted)
        }
    };

    match submitted {
        Some(submitted) if constant_time_eq(submitted.as_bytes(), token.as_bytes()) => {
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "CSRF token missing or invalid"
            );
            Err(AppError::Client(StatusCode::BAD_REQUEST))
        }
    }
}

/// 413 for an oversized body, 400 for any other read failure.
fn body_error(err: axum::Error) -> AppError {
    let inner = err.into_inner();
    let first: &(dyn std::error::Error + 'static) = inner.as_ref();
    let mut cause = Some(first);
    while let Some(e) = cause {
        if e.is::<LengthLimitError>() {
            return AppError::Client(StatusCode::PAYLOAD_TOO_LARGE);
        }
        cause = e.source();
    }
    tracing::debug!(error = %inner, "failed to read request body");
    AppError::Client(StatusCode::BAD_REQUEST)
}

fn is_form(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_methods() {
        assert!(is_safe(&Method::GET));
        assert!(is_safe(&Method::HEAD));
        assert!(is_safe(&Method::OPTIONS));
        assert!(is_safe(&Method::TRACE));
        assert!(!is_safe(&Method::POST));
        assert!(!is_safe(&Method::DELETE));
    }

    #[test]
    fn comparison() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"", b"a"));
    }
}
