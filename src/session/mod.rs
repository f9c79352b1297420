//! Cookie-correlated, server-side sessions.
//!
//! # Data Flow
//! ```text
//! Cookie: session=<id>
//!     → tower-sessions manager (lazy load from MemoryStore)
//!     → handlers read/write through the Session handle
//!     → tower-sessions manager (save if modified, Set-Cookie)
//!     → middleware.rs (Vary / Cache-Control on responses that set the cookie)
//! ```
//!
//! A [`Session`] handle is scoped to one request; clones share the same state.

pub mod middleware;
pub mod store;

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Extensions;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::config::SessionConfig;
use crate::http::errors::AppError;

pub use middleware::vary_on_cookie;
pub use store::MemoryStore;

const TOKEN_LEN: usize = 32;

/// Well-known session keys.
pub mod keys {
    pub const AUTHENTICATED_USER_ID: &str = "authenticated_user_id";
    pub const CSRF_TOKEN: &str = "csrf_token";
    pub const FLASH: &str = "flash";
    pub const REDIRECT_AFTER_LOGIN: &str = "redirect_path_after_login";
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session in request extensions; is the session layer installed?")]
    MissingLayer,

    #[error("session store: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

/// Per-request session handle with typed accessors.
#[derive(Debug, Clone)]
pub struct Session(tower_sessions::Session);

impl Session {
    /// The session the manager attached to this request.
    pub fn from_extensions(extensions: &Extensions) -> Result<Self, SessionError> {
        extensions
            .get::<tower_sessions::Session>()
            .cloned()
            .map(Self)
            .ok_or(SessionError::MissingLayer)
    }

    /// Boolean under `key`; absent reads as `false`.
    pub async fn get_bool(&self, key: &str) -> Result<bool, SessionError> {
        Ok(self.0.get(key).await?.unwrap_or(false))
    }

    /// Store a boolean under `key`.
    pub async fn put_bool(&self, key: &str, value: bool) -> Result<(), SessionError> {
        Ok(self.0.insert(key, value).await?)
    }

    /// Integer value under `key`, if set.
    pub async fn get_int(&self, key: &str) -> Result<Option<i64>, SessionError> {
        Ok(self.0.get(key).await?)
    }

    /// Store an integer under `key`.
    pub async fn put_int(&self, key: &str, value: i64) -> Result<(), SessionError> {
        Ok(self.0.insert(key, value).await?)
    }

    /// String value under `key`, if set.
    pub async fn get_string(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.0.get(key).await?)
    }

    /// Store a string under `key`.
    pub async fn put_string(&self, key: &str, value: impl Into<String>) -> Result<(), SessionError> {
        Ok(self.0.insert(key, value.into()).await?)
    }

    /// Read and remove a string; empty when absent.
    pub async fn pop_string(&self, key: &str) -> Result<String, SessionError> {
        Ok(self.0.remove::<String>(key).await?.unwrap_or_default())
    }

    /// Drop `key` whatever its type.
    pub async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.0.remove_value(key).await?;
        Ok(())
    }

    /// Issue a new id for the same data; the old record is deleted.
    pub async fn renew_token(&self) -> Result<(), SessionError> {
        Ok(self.0.cycle_id().await?)
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_extensions(&parts.extensions)?)
    }
}

#[derive(Debug, Clone)]
struct CookieSettings {
    name: String,
    lifetime: Duration,
    secure: bool,
}

/// Builds the session layer over a shared [`MemoryStore`] and runs its sweeper.
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: MemoryStore,
    cookie: CookieSettings,
}

impl SessionManager {
    /// Create a manager for `store` with the configured cookie attributes.
    pub fn new(store: MemoryStore, config: &SessionConfig) -> Self {
        Self {
            store,
            cookie: CookieSettings {
                name: config.cookie_name.clone(),
                lifetime: Duration::from_secs(config.lifetime_secs),
                secure: config.secure,
            },
        }
    }

    /// The load-and-save layer. Every layer shares the one store.
    pub fn layer(&self) -> SessionManagerLayer<MemoryStore> {
        let lifetime = i64::try_from(self.cookie.lifetime.as_secs()).unwrap_or(i64::MAX);
        SessionManagerLayer::new(self.store.clone())
            .with_name(self.cookie.name.clone())
            .with_path("/")
            .with_http_only(true)
            .with_same_site(SameSite::Lax)
            .with_secure(self.cookie.secure)
            .with_expiry(Expiry::OnInactivity(time::Duration::seconds(lifetime)))
    }

    /// Periodically purge expired records until shutdown.
    pub fn spawn_cleanup(
        &self,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = store.purge_expired();
                        if purged > 0 {
                            tracing::debug!(purged, "purged expired sessions");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("session sweeper received shutdown signal");
                        break;
                    }
                }
            }
        })
    }
}

pub(crate) fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
