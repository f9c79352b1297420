//! Authentication state: per-request flag propagation and the route gate.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::http::context::with_auth;
use crate::http::errors::AppError;
use crate::http::server::AppState;
use crate::session::{keys, Session};

pub const LOGIN_PATH: &str = "/user/login";

/// Derive the authentication flag from the session and the user store.
///
/// A session naming a user that no longer exists counts as anonymous.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = Session::from_extensions(request.extensions())?;
    let authenticated = match session.get_int(keys::AUTHENTICATED_USER_ID).await? {
        Some(id) => state.users.exists(id).await?,
        None => false,
    };
    with_auth(request.extensions_mut(), authenticated);
    Ok(next.run(request).await)
}

/// Redirect anonymous requests to the login page without running the handler.
///
/// Reads the session directly rather than the propagated flag.
pub async fn require_authentication(request: Request, next: Next) -> Result<Response, AppError> {
    let session = Session::from_extensions(request.extensions())?;
    if session.get_int(keys::AUTHENTICATED_USER_ID).await?.is_some() {
        return Ok(next.run(request).await);
    }

    if request.method() == Method::GET {
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| "/".to_owned());
        session.put_string(keys::REDIRECT_AFTER_LOGIN, target).await?;
    }
    tracing::debug!(path = %request.uri().path(), "anonymous request to protected route");
    Ok(Redirect::to(LOGIN_PATH).into_response())
}
