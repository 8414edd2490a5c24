//! Dashboard View
//!
//! Projection of timer and tracking state into what a client renders. The
//! projection is a pure function so any front end can subscribe to the raw
//! state and re-render without holding logic of its own.

use serde::{Deserialize, Serialize};

use crate::models::location_point::Fix;
use crate::models::timer_state::TimerSnapshot;

/// Rendered counters and tracking status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub total: String,
    pub checkpoint: String,
    pub waypoint: String,
    pub total_running: bool,
    pub checkpoint_running: bool,
    pub waypoint_running: bool,
    pub is_tracking: bool,
    pub active_session_id: Option<i64>,
    pub last_fix: Option<Fix>,
}

/// Tracking-side inputs of the projection
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub is_tracking: bool,
    pub active_session_id: Option<i64>,
    pub last_fix: Option<Fix>,
}

impl DashboardView {
    pub fn project(timer: &TimerSnapshot, tracking: &TrackingStatus) -> Self {
        Self {
            total: format_elapsed(timer.total),
            checkpoint: format_elapsed(timer.checkpoint),
            waypoint: format_elapsed(timer.waypoint),
            total_running: timer.total_running,
            checkpoint_running: timer.checkpoint_running,
            waypoint_running: timer.waypoint_running,
            is_tracking: tracking.is_tracking,
            active_session_id: tracking.active_session_id,
            last_fix: tracking.last_fix,
        }
    }
}

/// Format milliseconds as `HH:MM:SS.mmm`
pub fn format_elapsed(millis: u64) -> String {
    let hours = millis / 3_600_000;
    let minutes = (millis / 60_000) % 60;
    let seconds = (millis / 1000) % 60;
    let ms = millis % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00.000");
        assert_eq!(format_elapsed(1_234), "00:00:01.234");
        assert_eq!(format_elapsed(3_723_004), "01:02:03.004");
        assert_eq!(format_elapsed(100 * 3_600_000), "100:00:00.000");
    }

    #[test]
    fn test_projection_copies_flags() {
        let timer = TimerSnapshot {
            total: 61_000,
            checkpoint: 500,
            waypoint: 0,
            total_running: true,
            checkpoint_running: true,
            waypoint_running: false,
        };
        let tracking = TrackingStatus {
            is_tracking: true,
            active_session_id: Some(7),
            last_fix: None,
        };

        let view = DashboardView::project(&timer, &tracking);

        assert_eq!(view.total, "00:01:01.000");
        assert_eq!(view.checkpoint, "00:00:00.500");
        assert!(view.total_running);
        assert!(!view.waypoint_running);
        assert_eq!(view.active_session_id, Some(7));
    }
}
