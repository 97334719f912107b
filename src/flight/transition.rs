//! Station Transition Table
//!
//! The single source of truth for what a flight looks like once a station
//! owns it. Consulted by flight creation and by every handoff.
//!
//! ```text
//! toControl │ status    │ position             │ altitude │ next
//! ──────────┼───────────┼──────────────────────┼──────────┼──────
//! DEL       │ scheduled │ Gate                 │        0 │ GND
//! GND       │ taxiing   │ Taxiway              │        0 │ TWR
//! TWR       │ ready     │ Runway Holding Point │        0 │ APP
//! APP       │ departed  │ Departure Area       │     5000 │ CEN
//! CEN       │ cruising  │ Enroute              │    35000 │ CEN
//! ```

use crate::core_types::{FlightStatus, Station};

pub const GATE_POSITION: &str = "Gate";
pub const TAXIWAY_POSITION: &str = "Taxiway";
pub const RUNWAY_HOLD_POSITION: &str = "Runway Holding Point";
pub const DEPARTURE_AREA_POSITION: &str = "Departure Area";
pub const ENROUTE_POSITION: &str = "Enroute";

/// Departure altitude assigned once APP owns the flight (feet)
pub const APP_ALTITUDE: u32 = 5000;
/// Cruise altitude assigned once CEN owns the flight (feet)
pub const CEN_ALTITUDE: u32 = 35000;

/// Canonical derived state for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationState {
    pub status: FlightStatus,
    pub position: &'static str,
    pub altitude: u32,
    pub next_control: Station,
}

/// Derived state for a flight owned by `to_control`.
pub fn transition(to_control: Station) -> StationState {
    let (status, position, altitude) = match to_control {
        Station::Del => (FlightStatus::Scheduled, GATE_POSITION, 0),
        Station::Gnd => (FlightStatus::Taxiing, TAXIWAY_POSITION, 0),
        Station::Twr => (FlightStatus::Ready, RUNWAY_HOLD_POSITION, 0),
        Station::App => (FlightStatus::Departed, DEPARTURE_AREA_POSITION, APP_ALTITUDE),
        Station::Cen => (FlightStatus::Cruising, ENROUTE_POSITION, CEN_ALTITUDE),
    };

    StationState {
        status,
        position,
        altitude,
        next_control: to_control.next(),
    }
}
