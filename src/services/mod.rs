//! Services module for Stride Tracker
//!
//! Contains all business logic and service implementations.

pub mod auth_service;
pub mod backend_client;
pub mod location_service;
pub mod time_provider;
pub mod timer_service;
pub mod websocket_service;
pub mod workout_service;

// Re-export commonly used services
pub use auth_service::{AuthError, AuthenticationClient};
pub use backend_client::{BackendClient, BackendError};
pub use location_service::{LastFixProvider, LocationProvider, LocationTracker, PermissionGate, StaticPermission, TrackingCommand};
pub use time_provider::{MockTimeProvider, SystemTimeProvider, TimeProvider};
pub use timer_service::{TimerCoordinator, TimerEvent, TimerServiceError};
pub use websocket_service::WebSocketService;
pub use workout_service::{WorkoutError, WorkoutService};
