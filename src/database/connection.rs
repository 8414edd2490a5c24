//! Database connection manager
//!
//! Owns the SQLite pool and creates the schema on startup.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{query, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Database connection manager
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pub pool: SqlitePool,
}

impl DatabaseManager {
    /// Create a new database manager with the given connection URL
    pub async fn new(database_url: &str) -> Result<Self> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| anyhow::anyhow!("Invalid database URL {}: {}", database_url, e))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own empty database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect_with(options)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

        debug!("Successfully connected to database");

        Ok(Self { pool })
    }

    /// Open a fresh in-memory database with the schema applied
    pub async fn in_memory() -> Result<Self> {
        let manager = Self::new("sqlite::memory:").await?;
        manager.migrate().await?;
        Ok(manager)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        self.create_tables().await?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Create database tables
    async fn create_tables(&self) -> Result<()> {
        // Users table
        query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Sessions table
        query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                remote_id TEXT,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                start_time INTEGER NOT NULL,
                distance_m REAL NOT NULL DEFAULT 0,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                avg_pace REAL NOT NULL DEFAULT 0,
                points_uploaded INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Location points table
        query(
            r#"
            CREATE TABLE IF NOT EXISTS location_points (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                timestamp INTEGER NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                kind TEXT NOT NULL DEFAULT 'plain' CHECK (kind IN ('plain', 'waypoint', 'checkpoint'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        query("CREATE INDEX IF NOT EXISTS idx_location_points_session ON location_points(session_id, timestamp)")
            .execute(&self.pool)
            .await?;

        // Key/value preferences (auth token, logged in user)
        query(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("SQLite tables created successfully");
        Ok(())
    }

    /// Test database connection
    pub async fn test_connection(&self) -> Result<()> {
        query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Database connection test failed: {}", e))?;

        debug!("Database connection test successful");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
