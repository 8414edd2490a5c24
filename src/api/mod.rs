//! HTTP API for Stride Tracker
//!
//! REST endpoints for the timer, workouts, session history and
//! authentication, plus the dashboard WebSocket.

pub mod auth;
pub mod sessions;
pub mod timer;
pub mod workout;

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::{header, HeaderValue, Method, Request},
    response::{Json, Response},
    routing::get,
    Router,
};
use chrono_tz::Tz;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::database::{LocationPointRepository, PreferencesRepository, SessionRepository, UserRepository};
use crate::error::AppResult;
use crate::request_span;
use crate::services::auth_service::AuthenticationClient;
use crate::services::backend_client::BackendClient;
use crate::services::location_service::{LastFixProvider, LocationTracker, StaticPermission};
use crate::services::time_provider::{SystemTimeProvider, TimeProvider};
use crate::services::timer_service::TimerCoordinator;
use crate::services::websocket_service::WebSocketService;
use crate::services::workout_service::WorkoutService;

/// Shared handler state; every field is cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub timezone: Tz,
    pub timer: TimerCoordinator,
    pub tracker: LocationTracker,
    pub permission: Arc<StaticPermission>,
    pub sessions: SessionRepository,
    pub points: LocationPointRepository,
    pub users: UserRepository,
    pub auth: AuthenticationClient,
    pub workouts: WorkoutService,
    pub websocket: WebSocketService,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> AppResult<Self> {
        Self::with_clock(config, pool, Arc::new(SystemTimeProvider::new()))
    }

    /// Wire every service over one pool and one clock
    pub fn with_clock(config: Config, pool: SqlitePool, clock: Arc<dyn TimeProvider>) -> AppResult<Self> {
        let timezone = config.tz()?;
        let timer = TimerCoordinator::new(config.tick_interval())?;
        let permission = Arc::new(StaticPermission::new(config.location_permission));
        let tracker = LocationTracker::new(Arc::new(LastFixProvider::new()), permission.clone());
        let backend = BackendClient::new(&config.api_base_url, config.request_timeout())?;

        let sessions = SessionRepository::new(pool.clone());
        let points = LocationPointRepository::new(pool.clone());
        let users = UserRepository::new(pool.clone());
        let preferences = PreferencesRepository::new(pool);

        let auth = AuthenticationClient::new(backend.clone(), users.clone(), preferences.clone());
        let workouts = WorkoutService::new(
            timer.clone(),
            tracker.clone(),
            sessions.clone(),
            points.clone(),
            preferences,
            backend,
            clock,
        );
        let websocket = WebSocketService::new(timer.clone(), tracker.clone());

        Ok(Self {
            config: Arc::new(config),
            timezone,
            timer,
            tracker,
            permission,
            sessions,
            points,
            users,
            auth,
            workouts,
            websocket,
        })
    }
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let api = Router::new()
        .route("/health", get(health_check))
        .merge(timer::routes())
        .merge(workout::routes())
        .merge(sessions::routes())
        .merge(auth::routes());

    Router::new()
        .nest("/api", api)
        .route("/ws", get(websocket_handler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request<_>| request_span!(request.method(), request.uri().path())),
                )
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.cors_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp(),
        "timer_running": state.timer.snapshot().total_running,
        "tracking": state.tracker.status().is_tracking,
        "websocket_connections": state.websocket.connection_count(),
    }))
}

async fn websocket_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let service = state.websocket.clone();
    ws.protocols(["stride-tracker"])
        .on_upgrade(move |socket| service.handle_connection(socket))
}
