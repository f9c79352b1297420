//! Request-scoped authentication flag.
//!
//! The flag lives in the request extensions under a private newtype, so only
//! this module can write or read it. Absence reads as "not authenticated".

use axum::http::Extensions;

#[derive(Debug, Clone, Copy)]
struct IsAuthenticated(bool);

/// Attach the flag to a request's extensions, replacing any previous value.
pub fn with_auth(extensions: &mut Extensions, authenticated: bool) {
    extensions.insert(IsAuthenticated(authenticated));
}

pub fn is_authenticated(extensions: &Extensions) -> bool {
    extensions
        .get::<IsAuthenticated>()
        .map(|flag| flag.0)
        .unwrap_or(false)
}
