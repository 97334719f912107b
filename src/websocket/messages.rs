//! WebSocket wire frames
//!
//! Every frame is a JSON object tagged by `"type"`. Field names are
//! camelCase to match the flight record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core_types::{ControlRole, SessionId, Station};
use crate::flight::{Flight, FlightError, NewFlight};
use crate::session::Session;

/// Client → core
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    Login {
        control_type: String,
        user_name: String,
    },
    /// Status board without a controller session
    InfoScreenConnect,
    GetFlights,
    /// `from_control`, `new_status` and `new_position` are advisory; the
    /// authoritative values are recomputed from `to_control`.
    FlightTransfer {
        flight_id: String,
        #[serde(default)]
        from_control: Option<String>,
        to_control: String,
        #[serde(default)]
        new_status: Option<String>,
        #[serde(default)]
        new_position: Option<String>,
    },
    FlightAdd(NewFlight),
    FlightDelete {
        flight_id: String,
    },
    FlightEdit {
        flight_id: String,
        remarks: String,
    },
    Ping,
}

impl ClientEvent {
    /// Wire name, echoed back in error frames
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Login { .. } => "login",
            ClientEvent::InfoScreenConnect => "info_screen_connect",
            ClientEvent::GetFlights => "get_flights",
            ClientEvent::FlightTransfer { .. } => "flight_transfer",
            ClientEvent::FlightAdd(_) => "flight_add",
            ClientEvent::FlightDelete { .. } => "flight_delete",
            ClientEvent::FlightEdit { .. } => "flight_edit",
            ClientEvent::Ping => "ping",
        }
    }
}

/// Core → client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Connected {
        session_id: SessionId,
    },
    FlightsData {
        flights: Vec<Flight>,
    },
    FlightAdded {
        flight: Flight,
    },
    FlightUpdated {
        flight: Flight,
    },
    FlightDeleted {
        flight_id: String,
        callsign: String,
    },
    /// Scoped notification for sessions of the receiving station
    FlightTransfer {
        flight: Flight,
        from_control: Station,
        to_control: Station,
        timestamp: DateTime<Utc>,
    },
    UsersUpdate {
        users: Vec<Session>,
    },
    UserConnected {
        user_name: String,
        control_type: ControlRole,
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },
    UserDisconnected {
        user_name: String,
        control_type: ControlRole,
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },
    Error {
        code: String,
        msg: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        request: Option<String>,
    },
    Pong,
}

impl ServerEvent {
    pub fn from_error(err: &FlightError, request: &str) -> Self {
        ServerEvent::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
            request: Some(request.to_string()),
        }
    }

    /// Wire name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::FlightsData { .. } => "flights_data",
            ServerEvent::FlightAdded { .. } => "flight_added",
            ServerEvent::FlightUpdated { .. } => "flight_updated",
            ServerEvent::FlightDeleted { .. } => "flight_deleted",
            ServerEvent::FlightTransfer { .. } => "flight_transfer",
            ServerEvent::UsersUpdate { .. } => "users_update",
            ServerEvent::UserConnected { .. } => "user_connected",
            ServerEvent::UserDisconnected { .. } => "user_disconnected",
            ServerEvent::Error { .. } => "error",
            ServerEvent::Pong => "pong",
        }
    }
}
