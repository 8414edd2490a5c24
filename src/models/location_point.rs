//! Location Point Model
//!
//! A timestamped GPS fix belonging to a session, optionally tagged as a
//! waypoint or checkpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Mean Earth radius used for great-circle distances
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Category tag of a recorded point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PointKind {
    #[default]
    Plain,
    Waypoint,
    Checkpoint,
}

/// A stored location point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub id: i64,
    pub session_id: i64,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: PointKind,
}

/// A raw position sample before it is assigned to a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub kind: PointKind,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>, kind: PointKind) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            kind,
        }
    }

    /// Whether the coordinates are within WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<&LocationPoint> for Fix {
    fn from(point: &LocationPoint) -> Self {
        Fix::new(point.latitude, point.longitude, point.timestamp, point.kind)
    }
}

/// Great-circle distance in metres between two coordinates
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

/// Length of a track in metres, following the points in order
pub fn track_distance_m(points: &[LocationPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_m(pair[0].latitude, pair[0].longitude, pair[1].latitude, pair[1].longitude))
        .sum()
}
