//! Workout API Endpoints
//!
//! Session recording: start, push fixes, stop. Also the current-location
//! query and the location permission switch.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::AppResult;
use crate::models::location_point::{Fix, LocationPoint, PointKind};
use crate::models::session::Session;
use crate::services::location_service::{PermissionGate, TrackingCommand};

const DEFAULT_WORKOUT_NAME: &str = "Workout";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workout", get(current_workout))
        .route("/workout/start", post(start_workout))
        .route("/workout/stop", post(stop_workout))
        .route("/workout/fix", post(record_fix))
        .route("/location/current", get(current_location))
        .route("/location/permission", put(set_location_permission))
}

#[derive(Debug, Default, Deserialize)]
pub struct StartWorkoutRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordFixRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub kind: PointKind,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentLocationResponse {
    pub location: Option<Fix>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub granted: bool,
}

pub async fn current_workout(State(state): State<AppState>) -> Json<Option<Session>> {
    Json(state.workouts.current_session().await)
}

pub async fn start_workout(
    State(state): State<AppState>,
    Json(request): Json<StartWorkoutRequest>,
) -> AppResult<(StatusCode, Json<Session>)> {
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_WORKOUT_NAME);

    let session = state.workouts.start(name, request.description.trim()).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn stop_workout(State(state): State<AppState>) -> AppResult<Json<Session>> {
    Ok(Json(state.workouts.stop().await?))
}

pub async fn record_fix(
    State(state): State<AppState>,
    Json(request): Json<RecordFixRequest>,
) -> AppResult<(StatusCode, Json<LocationPoint>)> {
    let point = state
        .workouts
        .record_fix(request.latitude, request.longitude, request.kind)
        .await?;
    Ok((StatusCode::CREATED, Json(point)))
}

pub async fn current_location(State(state): State<AppState>) -> Json<CurrentLocationResponse> {
    let location = state.tracker.handle(TrackingCommand::GetCurrentLocation).await;
    Json(CurrentLocationResponse { location })
}

pub async fn set_location_permission(
    State(state): State<AppState>,
    Json(request): Json<PermissionRequest>,
) -> Json<PermissionRequest> {
    state.permission.set(request.granted);
    Json(PermissionRequest {
        granted: state.permission.has_location_permission(),
    })
}
