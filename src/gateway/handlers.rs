//! HTTP query surface
//!
//! Read-only views of the flight set and sessions, plus the mirror
//! diagnostics. All mutations go through the WebSocket endpoint.

mod flights;
mod health;
mod mirror;
mod sessions;

pub use flights::{FlightQuery, get_flight, get_flights};
pub use health::{HealthResponse, health_check};
pub use mirror::{get_mirror_flights, get_reconcile, post_mirror_resync};
pub use sessions::get_sessions;

// utoipa path structs, referenced from the OpenAPI document
pub use flights::{__path_get_flight, __path_get_flights};
pub use health::__path_health_check;
pub use mirror::{__path_get_mirror_flights, __path_get_reconcile, __path_post_mirror_resync};
pub use sessions::__path_get_sessions;
