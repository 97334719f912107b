//! Flight entity and station transition table

pub mod error;
pub mod model;
pub mod transition;

pub use error::FlightError;
pub use model::{Flight, FlightPatch, NewFlight, RemarksEdit, is_valid_callsign};
pub use transition::{StationState, transition};
