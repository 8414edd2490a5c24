//! Session persistence
//!
//! Inserts, edits and deletes workout sessions, and serves the sorted and
//! aggregated views of the session history.

use sqlx::{query, query_as, Row, SqlitePool};
use tracing::Instrument;

use crate::database::millis_to_utc;
use crate::db_span;
use crate::error::{AppError, AppResult};
use crate::logging::log_database_operation;
use crate::models::session::{NewSession, Session, SessionSort, SessionStats, SortDirection};

const SESSION_COLUMNS: &str = "id, remote_id, name, description, start_time, distance_m, duration_ms, avg_pace, points_uploaded";

/// Session database row
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i64,
    remote_id: Option<String>,
    name: String,
    description: String,
    start_time: i64,
    distance_m: f64,
    duration_ms: i64,
    avg_pace: f64,
    points_uploaded: bool,
}

impl TryFrom<SessionRow> for Session {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: row.id,
            remote_id: row.remote_id,
            name: row.name,
            description: row.description,
            start_time: millis_to_utc(row.start_time)?,
            distance_m: row.distance_m,
            duration_ms: row.duration_ms,
            avg_pace: row.avg_pace,
            points_uploaded: row.points_uploaded,
        })
    }
}

fn into_sessions(rows: Vec<SessionRow>) -> AppResult<Vec<Session>> {
    rows.into_iter().map(Session::try_from).collect()
}

/// Pass-through store for workout sessions
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, session: &NewSession) -> AppResult<Session> {
        let result = query(
            r#"
            INSERT INTO sessions (name, description, start_time, distance_m, duration_ms, avg_pace)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.name)
        .bind(&session.description)
        .bind(session.start_time.timestamp_millis())
        .bind(session.distance_m)
        .bind(session.duration_ms)
        .bind(session.avg_pace)
        .execute(&self.pool)
        .instrument(db_span!("INSERT", "sessions"))
        .await?;

        log_database_operation("INSERT", "sessions", Some(result.rows_affected()));

        Ok(Session {
            id: result.last_insert_rowid(),
            remote_id: None,
            name: session.name.clone(),
            description: session.description.clone(),
            start_time: session.start_time,
            distance_m: session.distance_m,
            duration_ms: session.duration_ms,
            avg_pace: session.avg_pace,
            points_uploaded: false,
        })
    }

    pub async fn update(&self, session: &Session) -> AppResult<()> {
        let result = query(
            r#"
            UPDATE sessions
            SET remote_id = ?, name = ?, description = ?, start_time = ?, distance_m = ?, duration_ms = ?, avg_pace = ?,
                points_uploaded = ?
            WHERE id = ?
            "#,
        )
        .bind(&session.remote_id)
        .bind(&session.name)
        .bind(&session.description)
        .bind(session.start_time.timestamp_millis())
        .bind(session.distance_m)
        .bind(session.duration_ms)
        .bind(session.avg_pace)
        .bind(session.points_uploaded)
        .bind(session.id)
        .execute(&self.pool)
        .instrument(db_span!("UPDATE", "sessions"))
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::SessionNotFound);
        }
        log_database_operation("UPDATE", "sessions", Some(result.rows_affected()));
        Ok(())
    }

    /// Delete a session and, through the foreign key, its points
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span!("DELETE", "sessions"))
            .await?;

        log_database_operation("DELETE", "sessions", Some(result.rows_affected()));
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Session>> {
        let row = query_as::<_, SessionRow>(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Session::try_from).transpose()
    }

    /// Fetch a session or fail with `SessionNotFound`
    pub async fn get(&self, id: i64) -> AppResult<Session> {
        self.find_by_id(id).await?.ok_or(AppError::SessionNotFound)
    }

    /// All sessions in insertion order
    pub async fn all(&self) -> AppResult<Vec<Session>> {
        let rows = query_as::<_, SessionRow>(&format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;

        into_sessions(rows)
    }

    /// All sessions ordered by the given field; ties keep insertion order
    pub async fn sorted(&self, sort: SessionSort, direction: SortDirection) -> AppResult<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY {} {}, id ASC",
            sort.column(),
            direction.keyword()
        );

        let rows = query_as::<_, SessionRow>(&sql)
            .fetch_all(&self.pool)
            .instrument(db_span!("SELECT", "sessions"))
            .await?;

        into_sessions(rows)
    }

    pub async fn set_remote_id(&self, id: i64, remote_id: &str) -> AppResult<()> {
        let result = query("UPDATE sessions SET remote_id = ? WHERE id = ?")
            .bind(remote_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::SessionNotFound);
        }
        Ok(())
    }

    /// Record that the points of an uploaded session reached the backend
    pub async fn mark_points_uploaded(&self, id: i64) -> AppResult<()> {
        let result = query("UPDATE sessions SET points_uploaded = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::SessionNotFound);
        }
        Ok(())
    }

    /// Sum of all session distances in metres (0 when there are none)
    pub async fn total_distance(&self) -> AppResult<f64> {
        let row = query("SELECT COALESCE(SUM(distance_m), 0.0) AS total FROM sessions")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<f64, _>("total")?)
    }

    pub async fn average_distance(&self) -> AppResult<Option<f64>> {
        self.average("distance_m").await
    }

    pub async fn average_duration(&self) -> AppResult<Option<f64>> {
        self.average("duration_ms").await
    }

    pub async fn average_pace(&self) -> AppResult<Option<f64>> {
        self.average("avg_pace").await
    }

    async fn average(&self, column: &'static str) -> AppResult<Option<f64>> {
        let row = query(&format!("SELECT AVG({column}) AS average FROM sessions"))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<Option<f64>, _>("average")?)
    }

    /// All aggregates in one read
    pub async fn stats(&self) -> AppResult<SessionStats> {
        let row = query(
            r#"
            SELECT COUNT(*) AS session_count,
                   COALESCE(SUM(distance_m), 0.0) AS total_distance,
                   AVG(distance_m) AS average_distance,
                   AVG(duration_ms) AS average_duration,
                   AVG(avg_pace) AS average_pace
            FROM sessions
            "#,
        )
        .fetch_one(&self.pool)
        .instrument(db_span!("SELECT", "sessions"))
        .await?;

        Ok(SessionStats {
            session_count: row.try_get("session_count")?,
            total_distance_m: row.try_get("total_distance")?,
            average_distance_m: row.try_get("average_distance")?,
            average_duration_ms: row.try_get("average_duration")?,
            average_pace: row.try_get("average_pace")?,
        })
    }
}
