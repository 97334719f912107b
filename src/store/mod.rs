//! Flight Store
//!
//! Authoritative in-memory flight set backed by a single snapshot file.
//!
//! # Invariants
//!
//! 1. **Persist-before-return**: every mutation writes the snapshot before it
//!    returns, so memory and disk never diverge past one call.
//! 2. **Rollback on write failure**: if the snapshot cannot be written the
//!    in-memory change is undone and `Persistence` is returned.
//! 3. **Unique ids and callsigns**: enforced at insertion. Callers serialize
//!    access (see [`crate::coordinator`]) so the check and the insert are one
//!    atomic step.

pub mod seed;
pub mod snapshot;

use std::path::Path;

use tracing::{debug, info, warn};
use ulid::Ulid;
use validator::Validate;

use crate::core_types::Station;
use crate::flight::{Flight, FlightError, FlightPatch, NewFlight};
use snapshot::SnapshotFile;

pub struct FlightStore {
    flights: Vec<Flight>,
    snapshot: SnapshotFile,
}

impl FlightStore {
    /// Load the store from `path`, seeding and writing the initial flight set
    /// if the file does not exist.
    ///
    /// An unreadable or unparsable file is reported as `CorruptSnapshot`; the
    /// file is left untouched and the caller decides what to do.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FlightError> {
        let snapshot = SnapshotFile::new(path);

        let flights = match snapshot.read()? {
            Some(flights) => {
                info!(
                    path = %snapshot.path().display(),
                    flights = flights.len(),
                    "Flight snapshot loaded"
                );
                for flight in flights.iter().filter(|f| !f.is_consistent()) {
                    warn!(
                        flight_id = %flight.id,
                        callsign = %flight.callsign,
                        control = %flight.current_control,
                        "Snapshot flight does not match transition table"
                    );
                }
                flights
            }
            None => {
                let flights = seed::initial_flights();
                snapshot.write(&flights)?;
                info!(
                    path = %snapshot.path().display(),
                    flights = flights.len(),
                    "No flight snapshot found, seeded initial flights"
                );
                flights
            }
        };

        Ok(Self { flights, snapshot })
    }

    /// All flights in insertion order
    pub fn all(&self) -> &[Flight] {
        &self.flights
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Result<&Flight, FlightError> {
        self.flights
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| FlightError::FlightNotFound(id.to_string()))
    }

    pub fn get_by_callsign(&self, callsign: &str) -> Option<&Flight> {
        self.flights.iter().find(|f| f.callsign == callsign)
    }

    /// Flights currently owned by `station`
    pub fn get_by_control(&self, station: Station) -> Vec<&Flight> {
        self.flights
            .iter()
            .filter(|f| f.current_control == station)
            .collect()
    }

    /// Create a flight at DEL.
    pub fn add(&mut self, req: NewFlight) -> Result<Flight, FlightError> {
        req.validate()?;

        if self.get_by_callsign(&req.callsign).is_some() {
            return Err(FlightError::DuplicateCallsign(req.callsign));
        }

        let flight = Flight::create(self.next_id(), req);
        self.flights.push(flight.clone());

        if let Err(e) = self.persist() {
            self.flights.pop();
            return Err(e);
        }

        debug!(flight_id = %flight.id, callsign = %flight.callsign, "Flight added");
        Ok(flight)
    }

    /// Merge `patch` into flight `id`.
    pub fn update(&mut self, id: &str, patch: FlightPatch) -> Result<Flight, FlightError> {
        let index = self.index_of(id)?;
        let previous = self.flights[index].clone();
        patch.apply(&mut self.flights[index]);

        if let Err(e) = self.persist() {
            self.flights[index] = previous;
            return Err(e);
        }

        Ok(self.flights[index].clone())
    }

    /// Delete flight `id`, returning the removed record.
    pub fn remove(&mut self, id: &str) -> Result<Flight, FlightError> {
        let index = self.index_of(id)?;
        let removed = self.flights.remove(index);

        if let Err(e) = self.persist() {
            self.flights.insert(index, removed);
            return Err(e);
        }

        debug!(flight_id = %removed.id, callsign = %removed.callsign, "Flight removed");
        Ok(removed)
    }

    /// Write the full flight set to the snapshot file.
    pub fn persist(&self) -> Result<(), FlightError> {
        self.snapshot.write(&self.flights)
    }

    pub fn snapshot_path(&self) -> &Path {
        self.snapshot.path()
    }

    fn index_of(&self, id: &str) -> Result<usize, FlightError> {
        self.flights
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| FlightError::FlightNotFound(id.to_string()))
    }

    fn next_id(&self) -> String {
        loop {
            let id = Ulid::new().to_string();
            if self.flights.iter().all(|f| f.id != id) {
                return id;
            }
        }
    }
}
