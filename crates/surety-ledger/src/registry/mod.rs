//! Airline and flight registries
//!
//! Airlines gate who may act; flights gate what insurance and oracle
//! requests may refer to.

pub mod airline;
pub mod flight;

pub use airline::{Admission, Airline, AirlineRegistry, CandidateVotes};
pub use flight::{Flight, FlightRegistry};
