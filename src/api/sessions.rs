//! Session History API Endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::export::{export_gpx, GPX_CONTENT_TYPE};
use crate::models::location_point::LocationPoint;
use crate::models::session::{Session, SessionEdit, SessionSort, SessionStats, SortDirection};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/stats", get(session_stats))
        .route(
            "/sessions/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route("/sessions/:id/points", get(session_points))
        .route("/sessions/:id/gpx", get(session_gpx))
        .route("/sessions/:id/upload", post(upload_session))
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionListQuery {
    #[serde(default)]
    pub sort: SessionSort,
    #[serde(default)]
    pub order: SortDirection,
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> AppResult<Json<Vec<Session>>> {
    Ok(Json(state.sessions.sorted(query.sort, query.order).await?))
}

pub async fn session_stats(State(state): State<AppState>) -> AppResult<Json<SessionStats>> {
    Ok(Json(state.sessions.stats().await?))
}

pub async fn get_session(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Session>> {
    Ok(Json(state.sessions.get(id).await?))
}

pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(edit): Json<SessionEdit>,
) -> AppResult<Json<Session>> {
    if edit.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::validation_error("Session name must not be empty"));
    }

    let mut session = state.sessions.get(id).await?;
    session.apply(edit);
    state.sessions.update(&session).await?;
    Ok(Json(session))
}

pub async fn delete_session(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    state.workouts.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn session_points(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<LocationPoint>>> {
    // 404 rather than an empty list for unknown sessions
    state.sessions.get(id).await?;
    Ok(Json(state.points.for_session(id).await?))
}

pub async fn session_gpx(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<impl IntoResponse> {
    let session = state.sessions.get(id).await?;
    let points = state.points.for_session(id).await?;
    let document = export_gpx(&session.name, &points, state.timezone);

    Ok((
        [
            (header::CONTENT_TYPE, GPX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"session-{id}.gpx\""),
            ),
        ],
        document,
    ))
}

pub async fn upload_session(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Session>> {
    Ok(Json(state.workouts.upload(id).await?))
}
