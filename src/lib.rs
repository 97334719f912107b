//! Flight Handoff & Synchronization Core
//!
//! Authoritative flight state for a chain of air-traffic control stations,
//! strict handoff transitions, live fan-out to every attached controller
//! screen, and a best-effort mirror in an external key-value store.
//!
//! # Modules
//!
//! - [`core_types`] - Station codes, control roles, flight status
//! - [`flight`] - Flight record, mutation inputs and the transition table
//! - [`store`] - In-memory flight set persisted to a JSON snapshot
//! - [`handoff`] - Transfer of a flight between stations
//! - [`session`] - Logged-in controller sessions
//! - [`websocket`] - Connections, broadcast fabric, wire frames
//! - [`mirror`] - External mirror sync and reconciliation
//! - [`coordinator`] - Global critical section tying the above together
//! - [`gateway`] - axum HTTP + WebSocket front end

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod logging;

// Flight state
pub mod flight;
pub mod handoff;
pub mod store;

// Sessions and delivery
pub mod session;
pub mod websocket;

// External mirror
pub mod mirror;

pub mod coordinator;
pub mod gateway;

// Convenient re-exports at crate root
pub use coordinator::HandoffCoordinator;
pub use core_types::{ControlRole, FlightId, FlightStatus, SessionId, Station};
pub use flight::{Flight, FlightError, FlightPatch, NewFlight};
pub use handoff::{HandoffEngine, HandoffOutcome};
pub use mirror::{MemoryMirror, MirrorError, MirrorStore, MirrorSync, TinyWebDbMirror};
pub use session::{Session, SessionRegistry};
pub use store::FlightStore;
