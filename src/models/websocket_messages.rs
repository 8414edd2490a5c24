//! WebSocket Message Schemas
//!
//! Messages exchanged with live dashboard clients.

use serde::{Deserialize, Serialize};

use crate::models::dashboard::DashboardView;
use crate::models::timer_state::TimerKind;

/// Server → client messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Latest projected dashboard
    Dashboard { payload: DashboardView },

    /// A workout finished
    SessionEnded { elapsed_ms: u64 },

    /// Reply to a client ping
    Pong,

    /// A client command could not be processed
    Error { message: String },
}

/// Client → server messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    StartTimer { timer: TimerKind },
    StopTimer { timer: TimerKind },
    Ping,
}
