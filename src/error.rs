//! Error handling for Stride Tracker
//!
//! Centralized error types and handling for the application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::auth_service::AuthError;
use crate::services::backend_client::BackendError;
use crate::services::timer_service::TimerServiceError;
use crate::services::workout_service::WorkoutError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Timer error: {0}")]
    Timer(#[from] TimerServiceError),

    #[error("Workout error: {0}")]
    Workout(#[from] WorkoutError),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session not found")]
    SessionNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Location point at {point} precedes session start {start}")]
    PointBeforeSessionStart { point: String, start: String },
}

impl AppError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::PointBeforeSessionStart { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::SessionNotFound | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Timer(e) => e.status_code(),
            AppError::Workout(e) => e.status_code(),
            AppError::Authentication(e) => e.status_code(),
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DatabaseError",
            AppError::Timer(_) => "TimerError",
            AppError::Workout(_) => "WorkoutError",
            AppError::Authentication(_) => "AuthenticationError",
            AppError::Backend(_) => "BackendError",
            AppError::Configuration(_) => "ConfigurationError",
            AppError::Validation(_) => "ValidationError",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Conflict(_) => "Conflict",
            AppError::Internal(_) => "InternalError",
            AppError::Serialization(_) => "SerializationError",
            AppError::Io(_) => "IoError",
            AppError::SessionNotFound => "SessionNotFound",
            AppError::UserNotFound => "UserNotFound",
            AppError::PointBeforeSessionStart { .. } => "PointBeforeSessionStart",
        }
    }

    /// Check if this error should be logged as an error vs warning
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    pub fn validation_error(message: &str) -> Self {
        AppError::Validation(message.to_string())
    }

    pub fn bad_request(message: &str) -> Self {
        AppError::BadRequest(message.to_string())
    }

    pub fn conflict(message: &str) -> Self {
        AppError::Conflict(message.to_string())
    }

    pub fn internal_error(message: &str) -> Self {
        AppError::Internal(message.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let timestamp = chrono::Utc::now().timestamp();

        if self.is_server_error() {
            tracing::error!(error = %message, code = error_code, "Request failed");
        } else {
            tracing::warn!(error = %message, code = error_code, "Request rejected");
        }

        let body = Json(json!({
            "error": error_code,
            "message": message,
            "timestamp": timestamp
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
