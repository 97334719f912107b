//! Local-vs-mirror comparison
//!
//! Read-only diagnostic. Nothing here writes to either side.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::MirrorRow;
use super::sync::MirrorFailure;
use crate::flight::Flight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Local flight with no mirror entry
    MissingInMirror,
    /// Mirror entry with no local flight (stale)
    MissingLocally,
    /// Both exist but the mirrored fields differ
    FieldMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub callsign: String,
    pub kind: DiscrepancyKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub local_count: usize,
    pub mirror_count: usize,
    /// Counts agree and no per-key discrepancy was found
    pub matches: bool,
    pub discrepancies: Vec<Discrepancy>,
    pub recent_failures: Vec<MirrorFailure>,
    pub checked_at: DateTime<Utc>,
}

/// Compare the local set with decoded mirror rows.
pub fn compare(
    local: &[Flight],
    mirror: &[MirrorRow],
    recent_failures: Vec<MirrorFailure>,
) -> ReconcileReport {
    let by_callsign: HashMap<&str, &MirrorRow> =
        mirror.iter().map(|r| (r.callsign.as_str(), r)).collect();

    let mut discrepancies = Vec::new();

    for flight in local {
        match by_callsign.get(flight.callsign.as_str()) {
            None => discrepancies.push(Discrepancy {
                callsign: flight.callsign.clone(),
                kind: DiscrepancyKind::MissingInMirror,
                fields: Vec::new(),
            }),
            Some(row) => {
                let fields = differing_fields(flight, row);
                if !fields.is_empty() {
                    discrepancies.push(Discrepancy {
                        callsign: flight.callsign.clone(),
                        kind: DiscrepancyKind::FieldMismatch,
                        fields,
                    });
                }
            }
        }
    }

    for row in mirror {
        if !local.iter().any(|f| f.callsign == row.callsign) {
            discrepancies.push(Discrepancy {
                callsign: row.callsign.clone(),
                kind: DiscrepancyKind::MissingLocally,
                fields: Vec::new(),
            });
        }
    }

    ReconcileReport {
        local_count: local.len(),
        mirror_count: mirror.len(),
        matches: local.len() == mirror.len() && discrepancies.is_empty(),
        discrepancies,
        recent_failures,
        checked_at: Utc::now(),
    }
}

fn differing_fields(flight: &Flight, row: &MirrorRow) -> Vec<String> {
    let record = &row.record;
    let mut fields: Vec<&str> = Vec::new();
    if record.status != flight.status {
        fields.push("status");
    }
    if record.current_control != flight.current_control {
        fields.push("currentControl");
    }
    if record.next_control != flight.next_control {
        fields.push("nextControl");
    }
    if record.position != flight.position {
        fields.push("position");
    }
    if record.altitude != flight.altitude {
        fields.push("altitude");
    }
    fields.into_iter().map(String::from).collect()
}
