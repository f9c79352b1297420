//! SQLite-backed snippet store.

use chrono::{DateTime, Duration, Utc};
use futures_util::future::BoxFuture;
use serde::Serialize;
use sqlx::SqlitePool;

use super::{ModelError, SnippetStore};

/// A stored snippet of text.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SqliteSnippets {
    pool: SqlitePool,
}

impl SqliteSnippets {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SnippetStore for SqliteSnippets {
    fn insert<'a>(
        &'a self,
        title: &'a str,
        content: &'a str,
        expires_days: i64,
    ) -> BoxFuture<'a, Result<i64, ModelError>> {
        Box::pin(async move {
            let now = Utc::now();
            let result = sqlx::query(
                "INSERT INTO snippets (title, content, created, expires) VALUES (?, ?, ?, ?)",
            )
            .bind(title)
            .bind(content)
            .bind(now)
            .bind(now + Duration::days(expires_days))
            .execute(&self.pool)
            .await?;
            Ok(result.last_insert_rowid())
        })
    }

    fn get(&self, id: i64) -> BoxFuture<'_, Result<Snippet, ModelError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Snippet>(
                "SELECT id, title, content, created, expires FROM snippets
                 WHERE expires > ? AND id = ?",
            )
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ModelError::NoRecord)
        })
    }

    fn latest(&self) -> BoxFuture<'_, Result<Vec<Snippet>, ModelError>> {
        Box::pin(async move {
            let snippets = sqlx::query_as::<_, Snippet>(
                "SELECT id, title, content, created, expires FROM snippets
                 WHERE expires > ? ORDER BY id DESC LIMIT 10",
            )
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await?;
            Ok(snippets)
        })
    }
}
