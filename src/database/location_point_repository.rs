//! Location point persistence

use sqlx::{query, query_as, query_scalar, SqlitePool};
use tracing::Instrument;

use crate::database::millis_to_utc;
use crate::db_span;
use crate::error::{AppError, AppResult};
use crate::logging::log_database_operation;
use crate::models::location_point::{Fix, LocationPoint, PointKind};

#[derive(Debug, sqlx::FromRow)]
struct LocationPointRow {
    id: i64,
    session_id: i64,
    timestamp: i64,
    latitude: f64,
    longitude: f64,
    kind: PointKind,
}

impl TryFrom<LocationPointRow> for LocationPoint {
    type Error = AppError;

    fn try_from(row: LocationPointRow) -> Result<Self, Self::Error> {
        Ok(LocationPoint {
            id: row.id,
            session_id: row.session_id,
            timestamp: millis_to_utc(row.timestamp)?,
            latitude: row.latitude,
            longitude: row.longitude,
            kind: row.kind,
        })
    }
}

/// Pass-through store for recorded GPS fixes
#[derive(Debug, Clone)]
pub struct LocationPointRepository {
    pool: SqlitePool,
}

impl LocationPointRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a fix to a session.
    ///
    /// Rejects fixes stamped before the session started.
    pub async fn insert(&self, session_id: i64, fix: &Fix) -> AppResult<LocationPoint> {
        let start: Option<i64> = query_scalar("SELECT start_time FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        let start = start.ok_or(AppError::SessionNotFound)?;
        let timestamp = fix.timestamp.timestamp_millis();
        if timestamp < start {
            return Err(AppError::PointBeforeSessionStart {
                point: fix.timestamp.to_rfc3339(),
                start: millis_to_utc(start)?.to_rfc3339(),
            });
        }

        let result = query(
            r#"
            INSERT INTO location_points (session_id, timestamp, latitude, longitude, kind)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(timestamp)
        .bind(fix.latitude)
        .bind(fix.longitude)
        .bind(fix.kind)
        .execute(&self.pool)
        .instrument(db_span!("INSERT", "location_points"))
        .await?;

        Ok(LocationPoint {
            id: result.last_insert_rowid(),
            session_id,
            timestamp: fix.timestamp,
            latitude: fix.latitude,
            longitude: fix.longitude,
            kind: fix.kind,
        })
    }

    /// Points of a session in recording order
    pub async fn for_session(&self, session_id: i64) -> AppResult<Vec<LocationPoint>> {
        let rows = query_as::<_, LocationPointRow>(
            r#"
            SELECT id, session_id, timestamp, latitude, longitude, kind
            FROM location_points
            WHERE session_id = ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .instrument(db_span!("SELECT", "location_points"))
        .await?;

        rows.into_iter().map(LocationPoint::try_from).collect()
    }

    pub async fn latest_for_session(&self, session_id: i64) -> AppResult<Option<LocationPoint>> {
        let row = query_as::<_, LocationPointRow>(
            r#"
            SELECT id, session_id, timestamp, latitude, longitude, kind
            FROM location_points
            WHERE session_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LocationPoint::try_from).transpose()
    }

    pub async fn count_for_session(&self, session_id: i64) -> AppResult<i64> {
        let count = query_scalar("SELECT COUNT(*) FROM location_points WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn delete_for_session(&self, session_id: i64) -> AppResult<u64> {
        let result = query("DELETE FROM location_points WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        log_database_operation("DELETE", "location_points", Some(result.rows_affected()));
        Ok(result.rows_affected())
    }
}
