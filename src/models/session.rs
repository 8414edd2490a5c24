//! Session Model
//!
//! One recorded workout with its aggregate statistics, plus the sort keys
//! and summary figures used by the session history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A recorded workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Local identifier
    pub id: i64,

    /// Identifier assigned by the backend once uploaded
    pub remote_id: Option<String>,

    pub name: String,

    pub description: String,

    /// When tracking began
    pub start_time: DateTime<Utc>,

    /// Total distance in metres
    pub distance_m: f64,

    /// Total duration in milliseconds
    pub duration_ms: i64,

    /// Average pace in seconds per kilometre (0 when no distance was covered)
    pub avg_pace: f64,

    /// Whether the points reached the backend after the session itself
    #[serde(default)]
    pub points_uploaded: bool,
}

/// Fields needed to create a session row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub distance_m: f64,
    pub duration_ms: i64,
    pub avg_pace: f64,
}

impl NewSession {
    /// A session that has just started and has no statistics yet
    pub fn started(name: impl Into<String>, description: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            start_time,
            distance_m: 0.0,
            duration_ms: 0,
            avg_pace: 0.0,
        }
    }
}

/// Editable session fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionEdit {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Session {
    /// Apply a user edit
    pub fn apply(&mut self, edit: SessionEdit) {
        if let Some(name) = edit.name {
            self.name = name;
        }
        if let Some(description) = edit.description {
            self.description = description;
        }
    }

    /// Record final statistics for a finished run
    pub fn finish(&mut self, distance_m: f64, duration_ms: i64) {
        self.distance_m = distance_m;
        self.duration_ms = duration_ms;
        self.avg_pace = pace_seconds_per_km(distance_m, duration_ms);
    }

    /// Both the session and its points are on the backend
    pub fn is_uploaded(&self) -> bool {
        self.remote_id.is_some() && self.points_uploaded
    }
}

/// Seconds per kilometre for the given distance and duration
pub fn pace_seconds_per_km(distance_m: f64, duration_ms: i64) -> f64 {
    if distance_m <= 0.0 {
        return 0.0;
    }
    (duration_ms as f64 / 1000.0) / (distance_m / 1000.0)
}

/// Orderings offered by the session history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionSort {
    #[default]
    RecordedAt,
    Distance,
    Duration,
    Pace,
}

impl SessionSort {
    /// Column backing this ordering
    pub fn column(&self) -> &'static str {
        match self {
            SessionSort::RecordedAt => "start_time",
            SessionSort::Distance => "distance_m",
            SessionSort::Duration => "duration_ms",
            SessionSort::Pace => "avg_pace",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Aggregates across all stored sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_count: i64,
    pub total_distance_m: f64,
    pub average_distance_m: Option<f64>,
    pub average_duration_ms: Option<f64>,
    pub average_pace: Option<f64>,
}
