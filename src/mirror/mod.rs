//! Reconciliation Mirror
//!
//! Best-effort copy of the flight set in an external, eventually-consistent
//! key-value store, keyed by callsign. The local store is always
//! authoritative: mirror writes happen after the local commit, on a detached
//! worker, and their failures never reach the requester.
//!
//! # Backends
//!
//! - [`TinyWebDbMirror`]: HTTP form API (`action=update|search|delete`)
//! - [`MemoryMirror`]: in-process map, for tests and offline runs

pub mod error;
pub mod memory;
pub mod reconcile;
pub mod sync;
pub mod tinywebdb;

pub use error::MirrorError;
pub use memory::MemoryMirror;
pub use reconcile::{Discrepancy, DiscrepancyKind, ReconcileReport};
pub use sync::{MirrorFailure, MirrorSync, ResyncSummary};
pub use tinywebdb::TinyWebDbMirror;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{FlightStatus, Station};
use crate::flight::Flight;

/// Window of mirror keys to read, 1-based like the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorRange {
    pub no: usize,
    pub count: usize,
}

impl MirrorRange {
    pub fn first(count: usize) -> Self {
        Self { no: 1, count }
    }
}

/// Contract of the external key-value store. Every call may fail or
/// return stale data.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn put(&self, tag: &str, value: &str) -> Result<(), MirrorError>;

    /// `(tag, value)` pairs in the requested window
    async fn get_range(&self, range: MirrorRange) -> Result<Vec<(String, String)>, MirrorError>;

    async fn delete(&self, tag: &str) -> Result<(), MirrorError>;
}

/// Value stored under a flight's callsign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRecord {
    pub id: String,
    pub status: FlightStatus,
    pub current_control: Station,
    pub next_control: Station,
    pub position: String,
    pub altitude: u32,
    #[serde(default)]
    pub heading: u16,
    pub departure: String,
    pub destination: String,
    #[serde(default)]
    pub remarks: String,
    pub last_updated: DateTime<Utc>,
}

impl MirrorRecord {
    pub fn from_flight(flight: &Flight, now: DateTime<Utc>) -> Self {
        Self {
            id: flight.id.clone(),
            status: flight.status,
            current_control: flight.current_control,
            next_control: flight.next_control,
            position: flight.position.clone(),
            altitude: flight.altitude,
            heading: flight.heading,
            departure: flight.departure.clone(),
            destination: flight.destination.clone(),
            remarks: flight.remarks.clone(),
            last_updated: now,
        }
    }
}

/// A decoded mirror entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRow {
    pub callsign: String,
    pub record: MirrorRecord,
}

/// Decode raw `(tag, value)` pairs, dropping entries that are not flights.
pub fn decode_rows(raw: Vec<(String, String)>) -> Vec<MirrorRow> {
    raw.into_iter()
        .filter_map(|(tag, value)| match serde_json::from_str::<MirrorRecord>(&value) {
            Ok(record) => Some(MirrorRow {
                callsign: tag,
                record,
            }),
            Err(e) => {
                tracing::debug!(tag = %tag, error = %e, "Skipping non-flight mirror entry");
                None
            }
        })
        .collect()
}
