//! Backend Client
//!
//! HTTP communication with the remote account and session API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::location_point::LocationPoint;
use crate::models::session::Session;

/// Client for the remote REST backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a token
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, BackendError> {
        let url = format!("{}/account/login", self.base_url);
        debug!("Logging in at: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Self::parse(response).await
    }

    /// Create a remote account and receive its token
    pub async fn register(&self, registration: &RegisterRequest<'_>) -> Result<TokenResponse, BackendError> {
        let url = format!("{}/account/register", self.base_url);
        debug!("Registering at: {}", url);

        let response = self
            .client
            .post(&url)
            .json(registration)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Self::parse(response).await
    }

    /// Upload a finished session; returns the id the backend assigned
    pub async fn upload_session(&self, token: &str, session: &Session) -> Result<String, BackendError> {
        let url = format!("{}/sessions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&SessionUpload::from(session))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let created: CreatedResponse = Self::parse(response).await?;
        info!("Session {} uploaded as {}", session.id, created.id);
        Ok(created.id)
    }

    /// Upload the points of an already uploaded session
    pub async fn upload_locations(
        &self,
        token: &str,
        remote_id: &str,
        points: &[LocationPoint],
    ) -> Result<(), BackendError> {
        let url = format!("{}/sessions/{}/locations", self.base_url, remote_id);
        let body: Vec<LocationUpload> = points.iter().map(LocationUpload::from).collect();

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        info!("Uploaded {} points for session {}", points.len(), remote_id);
        Ok(())
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, BackendError> {
        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        response.json::<T>().await.map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn server_error(response: reqwest::Response) -> BackendError {
        let status = response.status();
        let error: ErrorResponse = response.json().await.unwrap_or_else(|_| ErrorResponse {
            error: format!("Status: {}", status),
        });
        BackendError::Server {
            status: status.as_u16(),
            message: error.error,
        }
    }
}

// Request/Response types

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpload {
    pub name: String,
    pub description: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub distance: f64,
    pub duration: i64,
    pub average_pace: f64,
}

impl From<&Session> for SessionUpload {
    fn from(session: &Session) -> Self {
        Self {
            name: session.name.clone(),
            description: session.description.clone(),
            start_time: session.start_time,
            distance: session.distance_m,
            duration: session.duration_ms,
            average_pace: session.avg_pace,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationUpload {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: crate::models::location_point::PointKind,
}

impl From<&LocationPoint> for LocationUpload {
    fn from(point: &LocationPoint) -> Self {
        Self {
            timestamp: point.timestamp,
            latitude: point.latitude,
            longitude: point.longitude,
            kind: point.kind,
        }
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}
