//! Flight record and mutation inputs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::transition::transition;
use crate::core_types::{FlightId, FlightStatus, Station};

static CALLSIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,3}\d{1,4}$").expect("callsign pattern compiles"));

/// `true` if `callsign` is two or three capital letters followed by one to
/// four digits, e.g. `CPA123`.
pub fn is_valid_callsign(callsign: &str) -> bool {
    CALLSIGN_RE.is_match(callsign)
}

fn validate_callsign(callsign: &str) -> Result<(), ValidationError> {
    if is_valid_callsign(callsign) {
        Ok(())
    } else {
        Err(ValidationError::new("callsign")
            .with_message("callsign must match [A-Z]{2,3}[0-9]{1,4}".into()))
    }
}

fn validate_airport(code: &str) -> Result<(), ValidationError> {
    if code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("airport")
            .with_message("airport code must be upper-case alphanumeric".into()))
    }
}

/// A flight under control of one station.
///
/// `status`, `position`, `altitude` and `next_control` always follow from
/// `current_control` via the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    #[schema(example = "01HZY3T8Q4W9J4X7M2B6C5D1EF")]
    pub id: FlightId,
    #[schema(example = "CPA123")]
    pub callsign: String,
    pub status: FlightStatus,
    pub current_control: Station,
    pub next_control: Station,
    #[schema(example = "Gate")]
    pub position: String,
    #[schema(example = 0)]
    pub altitude: u32,
    #[serde(default)]
    #[schema(example = 120)]
    pub heading: u16,
    #[schema(example = "VHHH")]
    pub departure: String,
    #[schema(example = "ZBAA")]
    pub destination: String,
    #[serde(default)]
    pub remarks: String,
}

impl Flight {
    /// Build a freshly created flight. New flights always start at DEL.
    pub fn create(id: FlightId, req: NewFlight) -> Self {
        let derived = transition(Station::Del);
        Self {
            id,
            callsign: req.callsign,
            status: derived.status,
            current_control: Station::Del,
            next_control: derived.next_control,
            position: derived.position.to_string(),
            altitude: derived.altitude,
            heading: req.heading,
            departure: req.departure,
            destination: req.destination,
            remarks: req.remarks,
        }
    }

    /// True if the derived fields agree with the transition table.
    pub fn is_consistent(&self) -> bool {
        let derived = transition(self.current_control);
        self.status == derived.status
            && self.position == derived.position
            && self.altitude == derived.altitude
            && self.next_control == derived.next_control
    }
}

/// Input for creating a flight (`flight_add`).
///
/// `status` and `position` are accepted for wire compatibility but are
/// advisory; the store derives them from the DEL row.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewFlight {
    #[validate(custom(function = "validate_callsign"))]
    pub callsign: String,
    #[validate(
        length(min = 3, max = 4, message = "airport code must be 3-4 characters"),
        custom(function = "validate_airport")
    )]
    pub departure: String,
    #[validate(
        length(min = 3, max = 4, message = "airport code must be 3-4 characters"),
        custom(function = "validate_airport")
    )]
    pub destination: String,
    #[serde(default)]
    #[validate(length(max = 256))]
    pub remarks: String,
    #[serde(default)]
    #[validate(range(max = 359))]
    pub heading: u16,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl NewFlight {
    pub fn new(
        callsign: impl Into<String>,
        departure: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            callsign: callsign.into(),
            departure: departure.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }
}

/// Input for replacing a flight's remarks (`flight_edit`).
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemarksEdit {
    #[validate(length(max = 256))]
    pub remarks: String,
}

/// Partial update merged into an existing flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightPatch {
    pub status: Option<FlightStatus>,
    pub current_control: Option<Station>,
    pub next_control: Option<Station>,
    pub position: Option<String>,
    pub altitude: Option<u32>,
    pub remarks: Option<String>,
}

impl FlightPatch {
    /// Patch that moves a flight to `station` with all derived fields.
    pub fn handoff(station: Station) -> Self {
        let derived = transition(station);
        Self {
            status: Some(derived.status),
            current_control: Some(station),
            next_control: Some(derived.next_control),
            position: Some(derived.position.to_string()),
            altitude: Some(derived.altitude),
            remarks: None,
        }
    }

    pub fn remarks(remarks: impl Into<String>) -> Self {
        Self {
            remarks: Some(remarks.into()),
            ..Default::default()
        }
    }

    pub fn apply(self, flight: &mut Flight) {
        if let Some(status) = self.status {
            flight.status = status;
        }
        if let Some(station) = self.current_control {
            flight.current_control = station;
        }
        if let Some(next) = self.next_control {
            flight.next_control = next;
        }
        if let Some(position) = self.position {
            flight.position = position;
        }
        if let Some(altitude) = self.altitude {
            flight.altitude = altitude;
        }
        if let Some(remarks) = self.remarks {
            flight.remarks = remarks;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callsign_pattern() {
        assert!(is_valid_callsign("CPA123"));
        assert!(is_valid_callsign("BA1"));
        assert!(is_valid_callsign("UAL7890"));

        assert!(!is_valid_callsign("cpa123"));
        assert!(!is_valid_callsign("C123"));
        assert!(!is_valid_callsign("CPAX123"));
        assert!(!is_valid_callsign("CPA12345"));
        assert!(!is_valid_callsign("CPA"));
        assert!(!is_valid_callsign(" CPA123"));
    }

    #[test]
    fn test_new_flight_validation() {
        assert!(NewFlight::new("CPA999", "VHHH", "ZBAA").validate().is_ok());
        assert!(NewFlight::new("bad", "VHHH", "ZBAA").validate().is_err());
        assert!(NewFlight::new("CPA999", "", "ZBAA").validate().is_err());
        assert!(NewFlight::new("CPA999", "VHHH", "zbaa").validate().is_err());

        let mut req = NewFlight::new("CPA999", "VHHH", "ZBAA");
        req.heading = 360;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_starts_at_del() {
        let mut req = NewFlight::new("CPA999", "VHHH", "ZBAA");
        req.status = Some("cruising".into());
        req.position = Some("Gate C3".into());
        req.heading = 90;

        let flight = Flight::create("f1".into(), req);
        assert_eq!(flight.current_control, Station::Del);
        assert_eq!(flight.next_control, Station::Gnd);
        assert_eq!(flight.status, FlightStatus::Scheduled);
        assert_eq!(flight.altitude, 0);
        assert_eq!(flight.heading, 90);
        assert!(flight.is_consistent());
    }

    #[test]
    fn test_handoff_patch() {
        let mut flight = Flight::create("f1".into(), NewFlight::new("CPA999", "VHHH", "ZBAA"));
        FlightPatch::handoff(Station::App).apply(&mut flight);

        assert_eq!(flight.current_control, Station::App);
        assert_eq!(flight.status, FlightStatus::Departed);
        assert_eq!(flight.altitude, 5000);
        assert_eq!(flight.next_control, Station::Cen);
        assert!(flight.is_consistent());

        FlightPatch::remarks("VIP").apply(&mut flight);
        assert_eq!(flight.remarks, "VIP");
        assert_eq!(flight.current_control, Station::App);
    }

    #[test]
    fn test_wire_shape() {
        let flight = Flight::create("7".into(), NewFlight::new("CPA999", "VHHH", "ZBAA"));
        let json = serde_json::to_value(&flight).unwrap();
        assert_eq!(json["currentControl"], "DEL");
        assert_eq!(json["nextControl"], "GND");
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["altitude"], 0);

        let back: Flight = serde_json::from_value(json).unwrap();
        assert_eq!(back, flight);
    }
}
