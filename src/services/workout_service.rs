//! Workout Service
//!
//! Session lifecycle: starting a run opens a session and starts the timer
//! and tracker, fixes are persisted as they arrive, and stopping finalises
//! distance, duration and pace. Finished sessions can be uploaded.

use std::sync::Arc;

use axum::http::StatusCode;
use tokio::sync::Mutex;

use crate::database::{LocationPointRepository, PreferencesRepository, SessionRepository};
use crate::error::{AppError, AppResult};
use crate::logging::log_session_saved;
use crate::models::location_point::{track_distance_m, Fix, LocationPoint, PointKind};
use crate::models::session::{NewSession, Session};
use crate::models::timer_state::TimerKind;
use crate::services::auth_service::AuthError;
use crate::services::backend_client::BackendClient;
use crate::services::location_service::LocationTracker;
use crate::services::time_provider::TimeProvider;
use crate::services::timer_service::TimerCoordinator;

#[derive(Clone)]
pub struct WorkoutService {
    timer: TimerCoordinator,
    tracker: LocationTracker,
    sessions: SessionRepository,
    points: LocationPointRepository,
    preferences: PreferencesRepository,
    backend: BackendClient,
    clock: Arc<dyn TimeProvider>,

    /// The session currently being recorded
    active: Arc<Mutex<Option<Session>>>,
}

impl std::fmt::Debug for WorkoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutService")
            .field("timer", &self.timer)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl WorkoutService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timer: TimerCoordinator,
        tracker: LocationTracker,
        sessions: SessionRepository,
        points: LocationPointRepository,
        preferences: PreferencesRepository,
        backend: BackendClient,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            timer,
            tracker,
            sessions,
            points,
            preferences,
            backend,
            clock,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Open a session stamped now, take over the total timer from zero and
    /// start the tracker
    pub async fn start(&self, name: &str, description: &str) -> AppResult<Session> {
        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            return Err(WorkoutError::AlreadyActive(current.id).into());
        }

        self.timer.reserve().await?;
        let session = match self
            .sessions
            .insert(&NewSession::started(name, description, self.clock.now_utc()))
            .await
        {
            Ok(session) => session,
            Err(e) => {
                self.timer.release().await;
                return Err(e);
            }
        };

        self.tracker.start(Some(session.id)).await;
        *active = Some(session.clone());

        log_session_saved(session.id, "start", 0.0, 0);
        Ok(session)
    }

    /// Stamp, persist and track a fix for the active session. Checkpoint and
    /// waypoint fixes restart the matching nested timer.
    pub async fn record_fix(&self, latitude: f64, longitude: f64, kind: PointKind) -> AppResult<LocationPoint> {
        let active = self.active.lock().await;
        let session_id = active.as_ref().map(|s| s.id).ok_or(WorkoutError::NoActiveWorkout)?;

        let fix = Fix::new(latitude, longitude, self.clock.now_utc(), kind);
        if !fix.is_valid() {
            return Err(WorkoutError::InvalidFix { latitude, longitude }.into());
        }

        let point = self.points.insert(session_id, &fix).await?;
        self.tracker.record_fix(fix).await;

        match kind {
            PointKind::Checkpoint => {
                self.timer.start_checkpoint().await;
            }
            PointKind::Waypoint => {
                self.timer.start_waypoint().await;
            }
            PointKind::Plain => {}
        }

        Ok(point)
    }

    /// Store the final statistics, then stop the run.
    ///
    /// The workout stays active, with the timer running, until the session
    /// row is updated, so a failed stop can be retried.
    pub async fn stop(&self) -> AppResult<Session> {
        let mut active = self.active.lock().await;
        let mut session = active.clone().ok_or(WorkoutError::NoActiveWorkout)?;

        let ticks = self.timer.elapsed(TimerKind::Total);
        let tick_ms = i64::try_from(self.timer.tick_interval().as_millis()).unwrap_or(1);
        let duration_ms = i64::try_from(ticks).unwrap_or(i64::MAX).saturating_mul(tick_ms);

        let points = self.points.for_session(session.id).await?;
        session.finish(track_distance_m(&points), duration_ms);
        self.sessions.update(&session).await?;

        *active = None;
        self.timer.release().await;
        self.tracker.stop().await;

        log_session_saved(session.id, "finish", session.distance_m, session.duration_ms);
        Ok(session)
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.active.lock().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Delete a finished session together with its points
    pub async fn delete_session(&self, session_id: i64) -> AppResult<()> {
        self.ensure_not_recording(session_id).await?;

        if !self.sessions.delete(session_id).await? {
            return Err(AppError::SessionNotFound);
        }
        Ok(())
    }

    /// Upload a finished session, then its points.
    ///
    /// The remote id is stored as soon as the session is created remotely;
    /// a retry after a failed points upload only resends the points.
    pub async fn upload(&self, session_id: i64) -> AppResult<Session> {
        self.ensure_not_recording(session_id).await?;

        let mut session = self.sessions.get(session_id).await?;
        if session.is_uploaded() {
            return Err(WorkoutError::AlreadyUploaded(session.remote_id.unwrap_or_default()).into());
        }

        let token = self.preferences.auth_token().await?.ok_or(AuthError::NotLoggedIn)?;
        let points = self.points.for_session(session_id).await?;

        let remote_id = match session.remote_id.clone() {
            Some(remote_id) => remote_id,
            None => {
                let remote_id = self.backend.upload_session(&token, &session).await?;
                self.sessions.set_remote_id(session_id, &remote_id).await?;
                session.remote_id = Some(remote_id.clone());
                remote_id
            }
        };

        self.backend.upload_locations(&token, &remote_id, &points).await?;
        self.sessions.mark_points_uploaded(session_id).await?;
        session.points_uploaded = true;

        log_session_saved(session.id, "upload", session.distance_m, session.duration_ms);
        Ok(session)
    }

    async fn ensure_not_recording(&self, session_id: i64) -> AppResult<()> {
        match self.active.lock().await.as_ref() {
            Some(active) if active.id == session_id => Err(WorkoutError::StillRecording(session_id).into()),
            _ => Ok(()),
        }
    }
}

/// Workout lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum WorkoutError {
    #[error("Session {0} is already being recorded")]
    AlreadyActive(i64),

    #[error("No workout is being recorded")]
    NoActiveWorkout,

    #[error("Invalid coordinates ({latitude}, {longitude})")]
    InvalidFix { latitude: f64, longitude: f64 },

    #[error("Session {0} is still being recorded")]
    StillRecording(i64),

    #[error("Session already uploaded as {0}")]
    AlreadyUploaded(String),
}

impl WorkoutError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkoutError::InvalidFix { .. } => StatusCode::BAD_REQUEST,
            WorkoutError::AlreadyActive(_)
            | WorkoutError::NoActiveWorkout
            | WorkoutError::StillRecording(_)
            | WorkoutError::AlreadyUploaded(_) => StatusCode::CONFLICT,
        }
    }
}
