//! Core types used throughout the system
//!
//! Stations, controller roles and flight status values. These are the
//! vocabulary shared by the store, the handoff engine and the wire protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::flight::error::FlightError;

/// Flight ID - opaque, unique, immutable after assignment.
pub type FlightId = String;

/// Session ID - scoped to a single WebSocket connection.
pub type SessionId = u64;

/// A control station that can own a flight.
///
/// The handoff chain is fixed:
///
/// ```text
/// DEL → GND → TWR → APP → CEN ─┐
///                        ▲     │
///                        └─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Station {
    /// Clearance delivery
    Del,
    /// Ground
    Gnd,
    /// Tower
    Twr,
    /// Approach / departure
    App,
    /// Area control (enroute)
    Cen,
}

impl Station {
    /// All stations in chain order.
    pub const ALL: [Station; 5] = [
        Station::Del,
        Station::Gnd,
        Station::Twr,
        Station::App,
        Station::Cen,
    ];

    /// Next station in the handoff chain. CEN loops onto itself.
    #[inline]
    pub fn next(&self) -> Station {
        match self {
            Station::Del => Station::Gnd,
            Station::Gnd => Station::Twr,
            Station::Twr => Station::App,
            Station::App => Station::Cen,
            Station::Cen => Station::Cen,
        }
    }

    /// True when `to` is the regular chain successor of `self`.
    #[inline]
    pub fn is_chain_step(&self, to: Station) -> bool {
        self.next() == to
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Station::Del => "DEL",
            Station::Gnd => "GND",
            Station::Twr => "TWR",
            Station::App => "APP",
            Station::Cen => "CEN",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Station {
    type Err = FlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEL" => Ok(Station::Del),
            "GND" => Ok(Station::Gnd),
            "TWR" => Ok(Station::Twr),
            "APP" => Ok(Station::App),
            "CEN" => Ok(Station::Cen),
            _ => Err(FlightError::InvalidStation(s.to_string())),
        }
    }
}

/// The role a controller session logs in as.
///
/// Every station is a role; `CON` is an observer (flight management desk)
/// that never owns flights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlRole {
    Del,
    Gnd,
    Twr,
    App,
    Cen,
    Con,
}

impl ControlRole {
    /// The station this role controls, `None` for the observer role.
    pub fn station(&self) -> Option<Station> {
        match self {
            ControlRole::Del => Some(Station::Del),
            ControlRole::Gnd => Some(Station::Gnd),
            ControlRole::Twr => Some(Station::Twr),
            ControlRole::App => Some(Station::App),
            ControlRole::Cen => Some(Station::Cen),
            ControlRole::Con => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlRole::Del => "DEL",
            ControlRole::Gnd => "GND",
            ControlRole::Twr => "TWR",
            ControlRole::App => "APP",
            ControlRole::Cen => "CEN",
            ControlRole::Con => "CON",
        }
    }
}

impl From<Station> for ControlRole {
    fn from(station: Station) -> Self {
        match station {
            Station::Del => ControlRole::Del,
            Station::Gnd => ControlRole::Gnd,
            Station::Twr => ControlRole::Twr,
            Station::App => ControlRole::App,
            Station::Cen => ControlRole::Cen,
        }
    }
}

impl fmt::Display for ControlRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ControlRole {
    type Err = FlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("CON") {
            return Ok(ControlRole::Con);
        }
        s.parse::<Station>().map(ControlRole::from)
    }
}

/// Flight status, always derived from the owning station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Scheduled,
    Boarding,
    Taxiing,
    Ready,
    Departed,
    Cruising,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "scheduled",
            FlightStatus::Boarding => "boarding",
            FlightStatus::Taxiing => "taxiing",
            FlightStatus::Ready => "ready",
            FlightStatus::Departed => "departed",
            FlightStatus::Cruising => "cruising",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
