//! Time Provider
//!
//! Wall-clock abstraction used to stamp fixes and session start times, so
//! tests can pin the clock.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};

pub trait TimeProvider: Send + Sync {
    /// Current UTC time
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current time in the given zone
    fn now_in_timezone(&self, timezone: Tz) -> DateTime<Tz> {
        self.now_utc().with_timezone(&timezone)
    }

    fn now_timestamp_millis(&self) -> i64 {
        self.now_utc().timestamp_millis()
    }
}

/// Reads the system clock
#[derive(Debug, Clone, Default)]
pub struct SystemTimeProvider;

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests
#[derive(Debug, Clone)]
pub struct MockTimeProvider {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockTimeProvider {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start_time)),
        }
    }

    pub fn set_time(&self, new_time: DateTime<Utc>) {
        if let Ok(mut time) = self.current_time.lock() {
            *time = new_time;
        }
    }

    pub fn advance(&self, duration: Duration) {
        if let Ok(mut time) = self.current_time.lock() {
            *time += duration;
        }
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.advance(Duration::seconds(seconds));
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        match self.current_time.lock() {
            Ok(time) => *time,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
