//! Serializable copy of the ledger state
//!
//! A snapshot carries state only. Parameters such as the participation fund
//! or the response quorum come from the [`SuretyConfig`](crate::SuretyConfig)
//! handed to [`SuretyLedger::restore`](crate::SuretyLedger::restore).

use crate::consensus::{Oracle, StatusRequest};
use crate::insurance::{Policy, Treasury};
use crate::registry::{Airline, CandidateVotes, Flight};
use serde::{Deserialize, Serialize};
use surety_common::{AccountId, CreditBalance, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub owner: AccountId,
    pub operational: bool,
    pub airlines: Vec<Airline>,
    pub candidate_votes: Vec<CandidateVotes>,
    pub flights: Vec<Flight>,
    pub policies: Vec<Policy>,
    pub credits: Vec<CreditBalance>,
    pub oracles: Vec<Oracle>,
    pub status_requests: Vec<StatusRequest>,
    pub treasury: Treasury,
    /// Unix seconds at which the snapshot was taken
    pub taken_at: i64,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
