//! WebSocket Service
//!
//! Live dashboard push. Each connection watches the timer and tracker
//! channels and receives the projected [`DashboardView`] whenever either
//! changed, at most once per push interval. Clients may drive the timers
//! with [`ClientMessage`] commands.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, MissedTickBehavior};
use uuid::Uuid;

use crate::models::dashboard::DashboardView;
use crate::models::websocket_messages::{ClientMessage, ServerMessage};
use crate::services::location_service::LocationTracker;
use crate::services::timer_service::{TimerCoordinator, TimerEvent};

/// Minimum spacing between two dashboard pushes on one connection
pub const DASHBOARD_PUSH_INTERVAL: Duration = Duration::from_millis(50);

/// Fan-out of dashboard state to WebSocket clients
#[derive(Debug, Clone)]
pub struct WebSocketService {
    timer: TimerCoordinator,
    tracker: LocationTracker,
    connections: Arc<AtomicUsize>,
}

impl WebSocketService {
    pub fn new(timer: TimerCoordinator, tracker: LocationTracker) -> Self {
        Self {
            timer,
            tracker,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of currently open connections
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    /// Current projection of timer and tracking state
    pub fn dashboard(&self) -> DashboardView {
        DashboardView::project(&self.timer.snapshot(), &self.tracker.status())
    }

    /// Serve one upgraded connection until the client goes away
    pub async fn handle_connection(self, mut socket: WebSocket) {
        let connection_id = Uuid::new_v4();
        self.connections.fetch_add(1, Ordering::Relaxed);
        tracing::info!(%connection_id, "Dashboard client connected");

        let mut timer_rx = self.timer.subscribe();
        let mut tracking_rx = self.tracker.subscribe();
        let mut events = self.timer.subscribe_events();

        let mut push = interval(DASHBOARD_PUSH_INTERVAL);
        push.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Initial state, so a client never waits for the first change
        let snapshot = *timer_rx.borrow_and_update();
        let tracking = *tracking_rx.borrow_and_update();
        let initial = ServerMessage::Dashboard { payload: DashboardView::project(&snapshot, &tracking) };
        if Self::send(&mut socket, &initial).await.is_err() {
            self.disconnect(connection_id);
            return;
        }

        loop {
            tokio::select! {
                incoming = socket.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(reply) = self.handle_client_message(&text).await {
                                if Self::send(&mut socket, &reply).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            if socket.send(Message::Pong(payload)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(%connection_id, "WebSocket error: {}", e);
                            break;
                        }
                    }
                }

                _ = push.tick() => {
                    let timer_changed = timer_rx.has_changed().unwrap_or(false);
                    let tracking_changed = tracking_rx.has_changed().unwrap_or(false);
                    if !timer_changed && !tracking_changed {
                        continue;
                    }

                    let snapshot = *timer_rx.borrow_and_update();
                    let tracking = *tracking_rx.borrow_and_update();
                    let message = ServerMessage::Dashboard { payload: DashboardView::project(&snapshot, &tracking) };
                    if Self::send(&mut socket, &message).await.is_err() {
                        break;
                    }
                }

                event = events.recv() => {
                    let message = match event {
                        Ok(TimerEvent::SessionEnded { elapsed_ms }) => ServerMessage::SessionEnded { elapsed_ms },
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(%connection_id, skipped, "Timer events lagged");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };
                    if Self::send(&mut socket, &message).await.is_err() {
                        break;
                    }
                }
            }
        }

        self.disconnect(connection_id);
    }

    /// Apply a client command. Returns a direct reply, if any; state changes
    /// reach the client through the regular dashboard push.
    pub async fn handle_client_message(&self, text: &str) -> Option<ServerMessage> {
        let message: ClientMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                return Some(ServerMessage::Error {
                    message: format!("Invalid message: {e}"),
                })
            }
        };

        let result = match message {
            ClientMessage::StartTimer { timer } => self.timer.start(timer).await,
            ClientMessage::StopTimer { timer } => self.timer.stop(timer).await,
            ClientMessage::Ping => return Some(ServerMessage::Pong),
        };

        match result {
            Ok(_) => None,
            Err(e) => Some(ServerMessage::Error { message: e.to_string() }),
        }
    }

    async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
        match serde_json::to_string(message) {
            Ok(json) => socket.send(Message::Text(json)).await,
            Err(e) => {
                tracing::error!("Failed to serialize server message: {}", e);
                Ok(())
            }
        }
    }

    fn disconnect(&self, connection_id: Uuid) {
        self.connections.fetch_sub(1, Ordering::Relaxed);
        tracing::info!(%connection_id, "Dashboard client disconnected");
    }
}
