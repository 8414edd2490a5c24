//! Integration Tests Module
//!
//! Each test builds the full router over a fresh in-memory database.

pub mod common;

mod test_auth_api;
mod test_sessions_api;
mod test_timer_api;
mod test_websocket_sync;
mod test_workout_api;
