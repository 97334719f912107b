//! Flight Error Types
//!
//! Local-store errors. These abort the single requesting operation and are
//! reported back to the requester; they never affect other sessions.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlightError {
    #[error("Flight not found: {0}")]
    FlightNotFound(String),

    #[error("Callsign already in use: {0}")]
    DuplicateCallsign(String),

    #[error("Invalid station: {0}")]
    InvalidStation(String),

    #[error("Invalid flight: {0}")]
    InvalidFlight(String),

    #[error("Corrupt snapshot {path}: {reason}")]
    CorruptSnapshot { path: String, reason: String },

    #[error("Snapshot write failed: {0}")]
    Persistence(String),
}

impl FlightError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            FlightError::FlightNotFound(_) => "FLIGHT_NOT_FOUND",
            FlightError::DuplicateCallsign(_) => "DUPLICATE_CALLSIGN",
            FlightError::InvalidStation(_) => "INVALID_STATION",
            FlightError::InvalidFlight(_) => "INVALID_FLIGHT",
            FlightError::CorruptSnapshot { .. } => "CORRUPT_SNAPSHOT",
            FlightError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            FlightError::FlightNotFound(_) => 404,
            FlightError::DuplicateCallsign(_) => 409,
            FlightError::InvalidStation(_) | FlightError::InvalidFlight(_) => 400,
            FlightError::CorruptSnapshot { .. } | FlightError::Persistence(_) => 500,
        }
    }
}

impl From<validator::ValidationErrors> for FlightError {
    fn from(e: validator::ValidationErrors) -> Self {
        FlightError::InvalidFlight(e.to_string())
    }
}
