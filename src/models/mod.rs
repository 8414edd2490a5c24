//! Models module for Stride Tracker
//!
//! Plain data types shared by the services, the repositories and the API.

pub mod auth_forms;
pub mod dashboard;
pub mod location_point;
pub mod session;
pub mod timer_state;
pub mod user;
pub mod websocket_messages;

// Re-export commonly used types
pub use dashboard::{DashboardView, TrackingStatus};
pub use location_point::{Fix, LocationPoint, PointKind};
pub use session::{NewSession, Session, SessionEdit, SessionSort, SessionStats, SortDirection};
pub use timer_state::{TimerKind, TimerSnapshot, TimerState};
pub use user::{NewUser, User};
pub use websocket_messages::{ClientMessage, ServerMessage};
