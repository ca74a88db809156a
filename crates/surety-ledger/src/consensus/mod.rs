//! Consensus module - airline admission quorum and oracle status agreement
//!
//! This module provides:
//! - Quorum rules for admission votes and oracle responses
//! - Oracle registration with index assignment
//! - Status request correlation until a response quorum is reached

pub mod oracle;
pub mod quorum;
pub mod request;

pub use oracle::{Oracle, OracleIndexes, OracleRegistry};
pub use quorum::{AdmissionQuorum, AdmissionRegime, ResponseQuorum};
pub use request::{
    OpenOutcome, RequestKey, RequestState, ResponseBucket, ResponseOutcome, StatusRequest,
    StatusRequestBook,
};

use crate::gate::Live;
use crate::registry::FlightRegistry;
use rand::rngs::StdRng;
use rand::SeedableRng;
use surety_common::{AccountId, Amount, FlightKey, Result, StatusCode};
use tracing::info;

/// A status fetch that was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: RequestKey,
    pub outcome: OpenOutcome,
}

/// Oracle registry plus the requests they answer
///
/// Owns the random source used for index assignment and request index
/// selection; seed it for reproducible runs.
#[derive(Debug)]
pub struct OracleConsensus {
    oracles: OracleRegistry,
    requests: StatusRequestBook,
    rng: StdRng,
}

impl OracleConsensus {
    pub fn new(oracles: OracleRegistry, requests: StatusRequestBook, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            oracles,
            requests,
            rng,
        }
    }

    pub fn register_oracle(
        &mut self,
        live: Live<'_>,
        caller: AccountId,
        fee_paid: Amount,
    ) -> Result<OracleIndexes> {
        self.oracles.register_oracle(live, caller, fee_paid, &mut self.rng)
    }

    /// Open a status request for a registered flight under a random index
    pub fn fetch_flight_status(
        &mut self,
        live: Live<'_>,
        flights: &FlightRegistry,
        flight: &FlightKey,
        caller: AccountId,
        now: i64,
    ) -> Result<FetchTicket> {
        flights.require(flight)?;

        let index = self.oracles.random_index(&mut self.rng);
        let key = RequestKey::new(index, flight.clone());
        let outcome = self.requests.open(live, key.clone(), caller, now);

        info!(request = %key, requester = %caller, ?outcome, "Status request opened");
        Ok(FetchTicket { key, outcome })
    }

    /// Validate a response without recording it
    pub fn evaluate_response(
        &self,
        key: &RequestKey,
        oracle: &AccountId,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        self.requests.evaluate(&self.oracles, key, oracle, status)
    }

    pub(crate) fn commit_response(
        &mut self,
        live: Live<'_>,
        key: &RequestKey,
        oracle: AccountId,
        outcome: ResponseOutcome,
    ) {
        self.requests.commit(live, key, oracle, outcome);
    }

    pub fn oracles(&self) -> &OracleRegistry {
        &self.oracles
    }

    pub fn requests(&self) -> &StatusRequestBook {
        &self.requests
    }
}
