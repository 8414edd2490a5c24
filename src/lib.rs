//! Stride Tracker
//!
//! Workout tracking core: a nested stopwatch, GPS track recording, local
//! session history with GPX export, and account/session sync against a
//! remote backend. Served over a small HTTP + WebSocket API.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
