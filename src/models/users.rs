//! SQLite-backed user store with bcrypt password hashes.

use chrono::Utc;
use futures_util::future::BoxFuture;
use sqlx::SqlitePool;

use super::{ModelError, UserStore};

#[derive(Clone)]
pub struct SqliteUsers {
    pool: SqlitePool,
    cost: u32,
}

impl SqliteUsers {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }
}

impl UserStore for SqliteUsers {
    fn insert<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<(), ModelError>> {
        Box::pin(async move {
            let password = password.to_owned();
            let cost = self.cost;
            // bcrypt is CPU-bound; keep it off the async workers.
            let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

            let result = sqlx::query(
                "INSERT INTO users (name, email, hashed_password, created) VALUES (?, ?, ?, ?)",
            )
            .bind(name)
            .bind(email)
            .bind(hashed)
            .bind(Utc::now())
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    Err(ModelError::DuplicateEmail)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn authenticate<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<i64, ModelError>> {
        Box::pin(async move {
            let row: Option<(i64, String)> =
                sqlx::query_as("SELECT id, hashed_password FROM users WHERE email = ?")
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await?;
            let (id, hashed) = row.ok_or(ModelError::InvalidCredentials)?;

            let password = password.to_owned();
            let matches =
                tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed)).await??;
            if matches {
                Ok(id)
            } else {
                Err(ModelError::InvalidCredentials)
            }
        })
    }

    fn exists(&self, id: i64) -> BoxFuture<'_, Result<bool, ModelError>> {
        Box::pin(async move {
            let (exists,): (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(exists)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::memory_pool;

    async fn store() -> SqliteUsers {
        SqliteUsers::new(memory_pool().await).with_cost(4)
    }

    #[tokio::test]
    async fn signup_then_authenticate() {
        let users = store().await;
        users.insert("Alice", "alice@example.com", "pa55word!").await.unwrap();

        let id = users.authenticate("alice@example.com", "pa55word!").await.unwrap();
        assert!(users.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_distinguished() {
        let users = store().await;
        users.insert("Alice", "alice@example.com", "pa55word!").await.unwrap();

        let err = users.insert("Other", "alice@example.com", "different1").await.unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEmail));
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let users = store().await;
        users.insert("Alice", "alice@example.com", "pa55word!").await.unwrap();

        let wrong_password = users.authenticate("alice@example.com", "nope").await;
        assert!(matches!(wrong_password, Err(ModelError::InvalidCredentials)));

        let unknown_email = users.authenticate("bob@example.com", "pa55word!").await;
        assert!(matches!(unknown_email, Err(ModelError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn exists_is_false_for_unknown_id() {
        assert!(!store().await.exists(99).await.unwrap());
    }
}
