//! User persistence

use sqlx::{query, query_as, SqlitePool};
use tracing::Instrument;

use crate::db_span;
use crate::error::{AppError, AppResult};
use crate::logging::log_database_operation;
use crate::models::user::{NewUser, User};

/// Pass-through store for locally known users
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user. Fails with `Conflict` when the email is taken.
    pub async fn insert(&self, user: &NewUser) -> AppResult<User> {
        let result = query("INSERT INTO users (first_name, last_name, email) VALUES (?, ?, ?)")
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .execute(&self.pool)
            .instrument(db_span!("INSERT", "users"))
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict(format!("email {} already registered", user.email))
                }
                other => AppError::Database(other),
            })?;

        log_database_operation("INSERT", "users", Some(result.rows_affected()));

        Ok(User {
            id: result.last_insert_rowid(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        })
    }

    pub async fn update(&self, user: &User) -> AppResult<()> {
        let result = query("UPDATE users SET first_name = ?, last_name = ?, email = ? WHERE id = ?")
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        log_database_operation("UPDATE", "users", Some(result.rows_affected()));
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        log_database_operation("DELETE", "users", Some(result.rows_affected()));
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = query_as::<_, User>("SELECT id, first_name, last_name, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = query_as::<_, User>("SELECT id, first_name, last_name, email FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn all(&self) -> AppResult<Vec<User>> {
        let users = query_as::<_, User>("SELECT id, first_name, last_name, email FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}
