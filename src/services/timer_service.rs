//! Timer Service
//!
//! Drives the nested workout stopwatch. A single background task advances
//! the counters once per tick while the total timer runs, and every change
//! is published to a latest-value channel that dashboards subscribe to.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::Instrument;

use crate::logging::log_timer_state_change;
use crate::models::timer_state::{TimerKind, TimerSnapshot, TimerState};
use crate::timer_span;

/// Discrete timer events, delivered to every subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    /// The total timer was stopped after running for `elapsed_ms`
    SessionEnded { elapsed_ms: u64 },
}

/// Coordinates the total, checkpoint and waypoint counters
#[derive(Debug, Clone)]
pub struct TimerCoordinator {
    state: Arc<Mutex<TimerState>>,

    /// Latest snapshot, last write wins
    snapshots: Arc<watch::Sender<TimerSnapshot>>,

    events: broadcast::Sender<TimerEvent>,

    /// Handle of the running tick loop, if any
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Set while a workout owns the total timer. Locked before `ticker`.
    reserved: Arc<Mutex<bool>>,

    tick_interval: Duration,
}

impl TimerCoordinator {
    /// Create a coordinator ticking once per `tick_interval`
    pub fn new(tick_interval: Duration) -> Result<Self, TimerServiceError> {
        if tick_interval.is_zero() {
            return Err(TimerServiceError::InvalidTickInterval);
        }

        let (snapshots, _) = watch::channel(TimerSnapshot::default());
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            snapshots: Arc::new(snapshots),
            events,
            ticker: Arc::new(Mutex::new(None)),
            reserved: Arc::new(Mutex::new(false)),
            tick_interval,
        })
    }

    /// Start the total timer from zero and spawn the tick loop.
    ///
    /// Returns `false` without touching anything if it is already running.
    pub async fn start_total(&self) -> bool {
        let mut ticker = self.ticker.lock().await;
        let mut state = self.state.lock().await;

        if !state.start_total() {
            log_timer_state_change("total", "start", false, state.elapsed(TimerKind::Total));
            return false;
        }

        let generation = state.generation();
        self.snapshots.send_replace(state.snapshot());
        drop(state);

        if let Some(previous) = ticker.replace(self.spawn_ticker(generation)) {
            previous.abort();
        }

        log_timer_state_change("total", "start", true, 0);
        true
    }

    /// Stop every timer, zero the counters and end the tick loop.
    ///
    /// Returns the total elapsed ticks reached before the reset. A
    /// `SessionEnded` event is broadcast when the timer was running.
    pub async fn stop_total(&self) -> u64 {
        let mut ticker = self.ticker.lock().await;
        let mut state = self.state.lock().await;

        let was_running = state.is_running(TimerKind::Total);
        let elapsed = state.stop_total();
        self.snapshots.send_replace(state.snapshot());
        drop(state);

        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        if was_running {
            // No receivers is fine
            let _ = self.events.send(TimerEvent::SessionEnded { elapsed_ms: elapsed });
        }

        log_timer_state_change("total", "stop", was_running, elapsed);
        elapsed
    }

    /// (Re)start the checkpoint timer from zero
    pub async fn start_checkpoint(&self) -> bool {
        self.start_nested(TimerKind::Checkpoint).await
    }

    pub async fn stop_checkpoint(&self) -> bool {
        self.stop_nested(TimerKind::Checkpoint).await
    }

    /// (Re)start the waypoint timer from zero
    pub async fn start_waypoint(&self) -> bool {
        self.start_nested(TimerKind::Waypoint).await
    }

    pub async fn stop_waypoint(&self) -> bool {
        self.stop_nested(TimerKind::Waypoint).await
    }

    /// Start the given timer on behalf of a client. Returns whether
    /// anything changed. The total timer is refused while reserved.
    pub async fn start(&self, kind: TimerKind) -> Result<bool, TimerServiceError> {
        match kind {
            TimerKind::Total => {
                let reserved = self.reserved.lock().await;
                if *reserved {
                    return Err(TimerServiceError::Reserved);
                }
                Ok(self.start_total().await)
            }
            TimerKind::Checkpoint | TimerKind::Waypoint => Ok(self.start_nested(kind).await),
        }
    }

    /// Stop the given timer on behalf of a client. Returns whether it was
    /// running. The total timer is refused while reserved.
    pub async fn stop(&self, kind: TimerKind) -> Result<bool, TimerServiceError> {
        match kind {
            TimerKind::Total => {
                let reserved = self.reserved.lock().await;
                if *reserved {
                    return Err(TimerServiceError::Reserved);
                }
                let was_running = self.is_running(TimerKind::Total);
                self.stop_total().await;
                Ok(was_running)
            }
            TimerKind::Checkpoint | TimerKind::Waypoint => Ok(self.stop_nested(kind).await),
        }
    }

    /// Take ownership of the total timer and (re)start it from zero. Until
    /// [`release`](Self::release), clients cannot start or stop it.
    pub async fn reserve(&self) -> Result<(), TimerServiceError> {
        let mut reserved = self.reserved.lock().await;
        if *reserved {
            return Err(TimerServiceError::Reserved);
        }

        if !self.start_total().await {
            self.stop_total().await;
            self.start_total().await;
        }
        *reserved = true;
        Ok(())
    }

    /// Stop the total timer and give up the reservation. Returns the
    /// elapsed ticks.
    pub async fn release(&self) -> u64 {
        let mut reserved = self.reserved.lock().await;
        *reserved = false;
        self.stop_total().await
    }

    pub async fn is_reserved(&self) -> bool {
        *self.reserved.lock().await
    }

    async fn start_nested(&self, kind: TimerKind) -> bool {
        let mut state = self.state.lock().await;
        let changed = state.start(kind);
        if changed {
            self.snapshots.send_replace(state.snapshot());
        }

        log_timer_state_change(&kind.to_string(), "start", changed, 0);
        changed
    }

    async fn stop_nested(&self, kind: TimerKind) -> bool {
        let mut state = self.state.lock().await;
        let was_running = state.is_running(kind);
        let elapsed = state.elapsed(kind);

        match kind {
            TimerKind::Checkpoint => state.stop_checkpoint(),
            TimerKind::Waypoint => state.stop_waypoint(),
            TimerKind::Total => return false,
        }
        self.snapshots.send_replace(state.snapshot());

        log_timer_state_change(&kind.to_string(), "stop", was_running, elapsed);
        was_running
    }

    fn spawn_ticker(&self, generation: u64) -> JoinHandle<()> {
        let state = self.state.clone();
        let snapshots = self.snapshots.clone();
        let period = self.tick_interval;

        tokio::spawn(
            async move {
                let mut interval = interval_at(Instant::now() + period, period);

                loop {
                    interval.tick().await;

                    let mut state = state.lock().await;
                    if state.generation() != generation || !state.tick() {
                        break;
                    }
                    snapshots.send_replace(state.snapshot());
                }

                tracing::debug!(generation, "Tick loop finished");
            }
            .instrument(timer_span!("tick", "total")),
        )
    }

    /// Wall-clock length of one tick
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> TimerSnapshot {
        *self.snapshots.borrow()
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        let snapshot = self.snapshot();
        match kind {
            TimerKind::Total => snapshot.total_running,
            TimerKind::Checkpoint => snapshot.checkpoint_running,
            TimerKind::Waypoint => snapshot.waypoint_running,
        }
    }

    pub fn elapsed(&self, kind: TimerKind) -> u64 {
        let snapshot = self.snapshot();
        match kind {
            TimerKind::Total => snapshot.total,
            TimerKind::Checkpoint => snapshot.checkpoint,
            TimerKind::Waypoint => snapshot.waypoint,
        }
    }

    /// Receiver of the latest snapshot; intermediate values may be skipped
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    /// Abort the tick loop without publishing anything
    pub async fn shutdown(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

/// Timer service errors
#[derive(Debug, thiserror::Error)]
pub enum TimerServiceError {
    #[error("Tick interval must be greater than zero")]
    InvalidTickInterval,

    #[error("Unknown timer: {0}")]
    UnknownTimer(String),

    #[error("Total timer is controlled by the active workout")]
    Reserved,
}

impl TimerServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TimerServiceError::InvalidTickInterval => StatusCode::INTERNAL_SERVER_ERROR,
            TimerServiceError::UnknownTimer(_) => StatusCode::BAD_REQUEST,
            TimerServiceError::Reserved => StatusCode::CONFLICT,
        }
    }
}
