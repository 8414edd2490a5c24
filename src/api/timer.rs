//! Timer API Endpoints
//!
//! Direct control of the nested stopwatch and the projected dashboard.

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::models::dashboard::DashboardView;
use crate::models::timer_state::{TimerKind, TimerSnapshot};
use crate::services::timer_service::TimerServiceError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/timer", get(get_timer))
        .route("/timer/:timer/:action", post(control_timer))
        .route("/dashboard", get(get_dashboard))
}

/// Result of a start/stop request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerControlResponse {
    /// Whether the request changed anything
    pub changed: bool,
    pub timer: TimerSnapshot,
}

pub async fn get_timer(State(state): State<AppState>) -> Json<TimerSnapshot> {
    Json(state.timer.snapshot())
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.websocket.dashboard())
}

/// `POST /timer/{total|checkpoint|waypoint}/{start|stop}`
pub async fn control_timer(
    State(state): State<AppState>,
    Path((timer, action)): Path<(String, String)>,
) -> AppResult<Json<TimerControlResponse>> {
    let kind = TimerKind::from_str(&timer).map_err(|_| TimerServiceError::UnknownTimer(timer.clone()))?;

    let changed = match action.as_str() {
        "start" => state.timer.start(kind).await?,
        "stop" => state.timer.stop(kind).await?,
        other => return Err(AppError::BadRequest(format!("Unknown timer action: {other}"))),
    };

    Ok(Json(TimerControlResponse {
        changed,
        timer: state.timer.snapshot(),
    }))
}
