//! Persisted preferences
//!
//! Small key/value store for values that outlive a process: the backend auth
//! token and the id of the logged in user.

use sqlx::{query, query_scalar, SqlitePool};

use crate::error::AppResult;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const LOGGED_IN_USER_KEY: &str = "logged_in_user_id";

#[derive(Debug, Clone)]
pub struct PreferencesRepository {
    pool: SqlitePool,
}

impl PreferencesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let value = query_scalar("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        query("INSERT INTO preferences (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> AppResult<()> {
        query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn auth_token(&self) -> AppResult<Option<String>> {
        self.get(AUTH_TOKEN_KEY).await
    }

    /// Id of the logged in user; unparseable values read as logged out
    pub async fn logged_in_user_id(&self) -> AppResult<Option<i64>> {
        Ok(self.get(LOGGED_IN_USER_KEY).await?.and_then(|v| v.parse().ok()))
    }

    /// Persist a successful login atomically
    pub async fn store_login(&self, token: &str, user_id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in [(AUTH_TOKEN_KEY, token.to_string()), (LOGGED_IN_USER_KEY, user_id.to_string())] {
            query("INSERT INTO preferences (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn clear_login(&self) -> AppResult<()> {
        self.remove(AUTH_TOKEN_KEY).await?;
        self.remove(LOGGED_IN_USER_KEY).await
    }
}
