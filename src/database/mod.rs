//! Database abstraction layer
//!
//! SQLite storage for users, sessions, location points and preferences.

pub mod connection;
pub mod location_point_repository;
pub mod preferences;
pub mod session_repository;
pub mod user_repository;

pub use connection::DatabaseManager;
pub use location_point_repository::LocationPointRepository;
pub use preferences::PreferencesRepository;
pub use session_repository::SessionRepository;
pub use user_repository::UserRepository;

use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};

/// Convert a stored epoch-millisecond column back to a timestamp
pub(crate) fn millis_to_utc(millis: i64) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Internal(format!("stored timestamp {millis} out of range")))
}
