//! Location Tracking Service
//!
//! Accepts start/stop/get-current-location commands, keeps the fixes recorded
//! during a run, and publishes the tracking status. Positioning itself comes
//! from a pluggable [`LocationProvider`]; access is gated by a
//! [`PermissionGate`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};

use tokio::sync::{watch, RwLock};

use crate::logging::log_location_recorded;
use crate::models::dashboard::TrackingStatus;
use crate::models::location_point::Fix;

/// Source of last-known positions
pub trait LocationProvider: Send + Sync {
    fn last_known_location(&self) -> Option<Fix>;

    /// Feed a fix received from the device
    fn observe(&self, _fix: &Fix) {}
}

/// Whether the location permission has been granted
pub trait PermissionGate: Send + Sync {
    fn has_location_permission(&self) -> bool;
}

/// Provider that remembers the most recent fix it observed
#[derive(Debug, Default)]
pub struct LastFixProvider {
    last: StdRwLock<Option<Fix>>,
}

impl LastFixProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationProvider for LastFixProvider {
    fn last_known_location(&self) -> Option<Fix> {
        self.last.read().ok().and_then(|last| *last)
    }

    fn observe(&self, fix: &Fix) {
        if let Ok(mut last) = self.last.write() {
            *last = Some(*fix);
        }
    }
}

/// Permission flag set from configuration, switchable at runtime
#[derive(Debug)]
pub struct StaticPermission(AtomicBool);

impl StaticPermission {
    pub fn new(granted: bool) -> Self {
        Self(AtomicBool::new(granted))
    }

    pub fn set(&self, granted: bool) {
        self.0.store(granted, Ordering::Relaxed);
    }
}

impl PermissionGate for StaticPermission {
    fn has_location_permission(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Commands accepted by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingCommand {
    Start { session_id: Option<i64> },
    Stop,
    GetCurrentLocation,
}

#[derive(Debug, Default)]
struct TrackerState {
    is_tracking: bool,
    session_id: Option<i64>,
    track: Vec<Fix>,
}

impl TrackerState {
    fn status(&self) -> TrackingStatus {
        TrackingStatus {
            is_tracking: self.is_tracking,
            active_session_id: self.session_id,
            last_fix: self.track.last().copied(),
        }
    }
}

/// Location tracker
#[derive(Clone)]
pub struct LocationTracker {
    state: Arc<RwLock<TrackerState>>,
    provider: Arc<dyn LocationProvider>,
    permission: Arc<dyn PermissionGate>,
    status: Arc<watch::Sender<TrackingStatus>>,
}

impl std::fmt::Debug for LocationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationTracker")
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

impl LocationTracker {
    pub fn new(provider: Arc<dyn LocationProvider>, permission: Arc<dyn PermissionGate>) -> Self {
        let (status, _) = watch::channel(TrackingStatus::default());
        Self {
            state: Arc::new(RwLock::new(TrackerState::default())),
            provider,
            permission,
            status: Arc::new(status),
        }
    }

    /// Dispatch a command. Only `GetCurrentLocation` yields a fix.
    pub async fn handle(&self, command: TrackingCommand) -> Option<Fix> {
        match command {
            TrackingCommand::Start { session_id } => {
                self.start(session_id).await;
                None
            }
            TrackingCommand::Stop => {
                self.stop().await;
                None
            }
            TrackingCommand::GetCurrentLocation => self.current_location().await,
        }
    }

    /// Begin a run with an empty track. Returns `false` if already tracking.
    pub async fn start(&self, session_id: Option<i64>) -> bool {
        let mut state = self.state.write().await;
        if state.is_tracking {
            return false;
        }

        state.is_tracking = true;
        state.session_id = session_id;
        state.track.clear();
        self.status.send_replace(state.status());

        tracing::info!(session_id, "Location tracking started");
        true
    }

    /// End the run and hand back the recorded track
    pub async fn stop(&self) -> Vec<Fix> {
        let mut state = self.state.write().await;
        let was_tracking = state.is_tracking;

        state.is_tracking = false;
        state.session_id = None;
        let track = std::mem::take(&mut state.track);
        self.status.send_replace(state.status());

        if was_tracking {
            tracing::info!(points = track.len(), "Location tracking stopped");
        }
        track
    }

    /// Offer a fix to the tracker. It is kept only while tracking.
    pub async fn record_fix(&self, fix: Fix) -> bool {
        self.provider.observe(&fix);

        let mut state = self.state.write().await;
        if !state.is_tracking {
            return false;
        }

        state.track.push(fix);
        self.status.send_replace(state.status());

        log_location_recorded(state.session_id.unwrap_or_default(), &fix.kind.to_string(), fix.latitude, fix.longitude);
        true
    }

    /// Most recent recorded fix while tracking, otherwise the provider's
    /// last-known position. `None` without location permission.
    pub async fn current_location(&self) -> Option<Fix> {
        if !self.permission.has_location_permission() {
            tracing::debug!("Location permission absent, no current location");
            return None;
        }

        let state = self.state.read().await;
        if state.is_tracking {
            if let Some(fix) = state.track.last() {
                return Some(*fix);
            }
        }
        drop(state);

        self.provider.last_known_location()
    }

    pub async fn is_tracking(&self) -> bool {
        self.state.read().await.is_tracking
    }

    pub async fn track(&self) -> Vec<Fix> {
        self.state.read().await.track.clone()
    }

    pub fn status(&self) -> TrackingStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackingStatus> {
        self.status.subscribe()
    }
}
