//! Handoff Engine
//!
//! The only path by which a flight's `currentControl` changes.
//!
//! The engine accepts any target station, not only `nextControl`: a
//! controller may bounce a flight backward or skip a station, and the engine
//! recomputes a fully consistent derived state for whatever it is given. The
//! only authority check is that the flight exists.
//!
//! The engine holds no lock. It must run inside the coordinator's critical
//! section, which guarantees one in-flight operation at a time.

use tracing::{debug, info};

use crate::core_types::Station;
use crate::flight::{Flight, FlightError, FlightPatch};
use crate::store::FlightStore;

/// Result of a committed handoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffOutcome {
    pub flight: Flight,
    pub from_control: Station,
    pub to_control: Station,
}

impl HandoffOutcome {
    /// True when the handoff followed the regular chain
    pub fn is_chain_step(&self) -> bool {
        self.from_control.is_chain_step(self.to_control)
    }
}

pub struct HandoffEngine;

impl HandoffEngine {
    /// Hand flight `flight_id` over to `to_control`.
    pub fn transfer(
        store: &mut FlightStore,
        flight_id: &str,
        to_control: Station,
    ) -> Result<HandoffOutcome, FlightError> {
        let from_control = store.get_by_id(flight_id)?.current_control;

        let flight = store.update(flight_id, FlightPatch::handoff(to_control))?;

        let outcome = HandoffOutcome {
            flight,
            from_control,
            to_control,
        };

        if outcome.is_chain_step() {
            debug!(
                flight_id,
                callsign = %outcome.flight.callsign,
                from = %from_control,
                to = %to_control,
                "Handoff committed"
            );
        } else {
            info!(
                flight_id,
                callsign = %outcome.flight.callsign,
                from = %from_control,
                to = %to_control,
                expected = %from_control.next(),
                "Handoff re-routed off the station chain"
            );
        }

        Ok(outcome)
    }

    /// Same as [`HandoffEngine::transfer`] with the target given as a wire
    /// station code.
    pub fn transfer_to_code(
        store: &mut FlightStore,
        flight_id: &str,
        to_control: &str,
    ) -> Result<HandoffOutcome, FlightError> {
        let station = to_control.parse::<Station>()?;
        Self::transfer(store, flight_id, station)
    }
}
