//! Persistence collaborator for snippets and users.
//!
//! Handlers only see the [`SnippetStore`] and [`UserStore`] traits; the SQLite
//! implementations live in [`snippets`] and [`users`]. Futures are boxed so the
//! stores can sit in shared state as `Arc<dyn …>` and be faked in tests.

pub mod snippets;
pub mod users;

use futures_util::future::BoxFuture;
use sqlx::SqlitePool;

pub use snippets::{Snippet, SqliteSnippets};
pub use users::SqliteUsers;

/// Errors surfaced by the stores.
///
/// `NoRecord`, `InvalidCredentials` and `DuplicateEmail` are expected outcomes
/// that handlers translate into 404s or form errors.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("no matching record found")]
    NoRecord,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub trait SnippetStore: Send + Sync {
    /// Insert a snippet expiring `expires_days` from now; returns its id.
    fn insert<'a>(
        &'a self,
        title: &'a str,
        content: &'a str,
        expires_days: i64,
    ) -> BoxFuture<'a, Result<i64, ModelError>>;

    /// Fetch one unexpired snippet.
    fn get(&self, id: i64) -> BoxFuture<'_, Result<Snippet, ModelError>>;

    /// The ten most recently created unexpired snippets.
    fn latest(&self) -> BoxFuture<'_, Result<Vec<Snippet>, ModelError>>;
}

pub trait UserStore: Send + Sync {
    fn insert<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<(), ModelError>>;

    /// Returns the user's id when the email and password match.
    fn authenticate<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<i64, ModelError>>;

    fn exists(&self, id: i64) -> BoxFuture<'_, Result<bool, ModelError>>;
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS snippets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created TEXT NOT NULL,
        expires TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_snippets_created ON snippets(created)",
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        hashed_password TEXT NOT NULL,
        created TEXT NOT NULL,
        CONSTRAINT users_uc_email UNIQUE (email)
    )",
];

/// Bootstrap DDL for a fresh database.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), ModelError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // One connection: every `:memory:` connection is its own database.
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_schema(&pool).await.unwrap();
    pool
}
