//! Initial flight set written when no snapshot exists yet

use crate::core_types::Station;
use crate::flight::{Flight, transition};

struct SeedFlight {
    id: &'static str,
    callsign: &'static str,
    control: Station,
    heading: u16,
    destination: &'static str,
}

const SEED: [SeedFlight; 6] = [
    SeedFlight {
        id: "1",
        callsign: "CPA123",
        control: Station::Del,
        heading: 0,
        destination: "ZBAA",
    },
    SeedFlight {
        id: "2",
        callsign: "CES456",
        control: Station::Del,
        heading: 0,
        destination: "RJTT",
    },
    SeedFlight {
        id: "3",
        callsign: "UAL789",
        control: Station::Gnd,
        heading: 120,
        destination: "KSFO",
    },
    SeedFlight {
        id: "4",
        callsign: "SIA890",
        control: Station::Twr,
        heading: 70,
        destination: "WSSS",
    },
    SeedFlight {
        id: "5",
        callsign: "AFR234",
        control: Station::App,
        heading: 45,
        destination: "LFPG",
    },
    SeedFlight {
        id: "6",
        callsign: "BAW567",
        control: Station::Cen,
        heading: 320,
        destination: "EGLL",
    },
];

/// Home airport of every seeded flight
pub const SEED_DEPARTURE: &str = "VHHH";

pub fn initial_flights() -> Vec<Flight> {
    SEED.iter()
        .map(|s| {
            let derived = transition(s.control);
            Flight {
                id: s.id.to_string(),
                callsign: s.callsign.to_string(),
                status: derived.status,
                current_control: s.control,
                next_control: derived.next_control,
                position: derived.position.to_string(),
                altitude: derived.altitude,
                heading: s.heading,
                departure: SEED_DEPARTURE.to_string(),
                destination: s.destination.to_string(),
                remarks: String::new(),
            }
        })
        .collect()
}
