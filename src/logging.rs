//! Logging configuration for Stride Tracker
//!
//! Structured logging setup with appropriate levels and formatting.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Initialize the application logging system.
///
/// `RUST_LOG` wins over `default_level`. JSON output is used in production,
/// compact console output otherwise.
pub fn init_logging(default_level: &str, json: bool) {
    let default_filter = format!("stride_tracker={default_level},tower_http=info,axum::rejection=trace");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let layer = if json { json_layer().boxed() } else { console_layer().boxed() };

    // A subscriber may already be installed (tests, embedding hosts)
    if Registry::default().with(layer.with_filter(env_filter)).try_init().is_ok() {
        tracing::info!("Logging system initialized");
    }
}

/// JSON logging layer for production
fn json_layer() -> impl Layer<Registry> + Send + Sync {
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
}

/// Console logging layer for development
fn console_layer() -> impl Layer<Registry> + Send + Sync {
    fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_ansi(true)
}

/// Create a span for request logging
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            status_code = tracing::field::Empty,
        )
    };
}

/// Create a span for database operations
#[macro_export]
macro_rules! db_span {
    ($operation:expr, $table:expr) => {
        tracing::debug_span!(
            "database_operation",
            operation = %$operation,
            table = %$table,
            rows_affected = tracing::field::Empty,
        )
    };
}

/// Create a span for timer operations
#[macro_export]
macro_rules! timer_span {
    ($operation:expr, $timer:expr) => {
        tracing::debug_span!(
            "timer_operation",
            operation = %$operation,
            timer = %$timer,
        )
    };
}

/// Log application startup
pub fn log_startup() {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Stride Tracker starting up");
}

/// Log timer state change
pub fn log_timer_state_change(timer: &str, operation: &str, changed: bool, elapsed: u64) {
    if changed {
        tracing::info!(
            timer = %timer,
            operation = %operation,
            elapsed_ms = elapsed,
            "Timer state changed"
        );
    } else {
        tracing::debug!(
            timer = %timer,
            operation = %operation,
            "Timer operation had no effect"
        );
    }
}

/// Log workout session persistence
pub fn log_session_saved(session_id: i64, operation: &str, distance_m: f64, duration_ms: i64) {
    tracing::info!(
        session_id = session_id,
        operation = %operation,
        distance_m = distance_m,
        duration_ms = duration_ms,
        "Session saved"
    );
}

/// Log a recorded location fix
pub fn log_location_recorded(session_id: i64, kind: &str, latitude: f64, longitude: f64) {
    tracing::debug!(
        session_id = session_id,
        kind = %kind,
        latitude = latitude,
        longitude = longitude,
        "Location recorded"
    );
}

/// Log database operation
pub fn log_database_operation(operation: &str, table: &str, rows_affected: Option<u64>) {
    tracing::debug!(
        operation = %operation,
        table = %table,
        rows_affected = ?rows_affected,
        "Database operation completed"
    );
}

/// Log authentication event
pub fn log_authentication_event(event: &str, email: &str, success: bool) {
    if success {
        tracing::info!(event = %event, email = %email, "Authentication successful");
    } else {
        tracing::warn!(event = %event, email = %email, "Authentication failed");
    }
}
