//! Status requests: correlating oracle responses until quorum
//!
//! A request is identified by the index drawn at fetch time plus the flight
//! key. Each accepted response lands in the bucket of the status it reports;
//! the first bucket to reach the response quorum closes the request, and any
//! later response to it is rejected.

use super::oracle::OracleRegistry;
use super::quorum::ResponseQuorum;
use crate::gate::Live;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use surety_common::{AccountId, FlightKey, OracleError, Result, StatusCode};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub index: u8,
    pub flight: FlightKey,
}

impl RequestKey {
    pub fn new(index: u8, flight: FlightKey) -> Self {
        Self { index, flight }
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.index, self.flight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RequestState {
    Open,
    Closed { status: StatusCode },
}

/// Oracles that reported one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBucket {
    pub status: StatusCode,
    pub oracles: BTreeSet<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub key: RequestKey,
    pub requester: AccountId,
    pub opened_at: i64,
    pub responses: Vec<ResponseBucket>,
    pub state: RequestState,
}

impl StatusRequest {
    fn new(key: RequestKey, requester: AccountId, opened_at: i64) -> Self {
        Self {
            key,
            requester,
            opened_at,
            responses: Vec::new(),
            state: RequestState::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == RequestState::Open
    }

    pub fn has_responded(&self, oracle: &AccountId) -> bool {
        self.responses.iter().any(|b| b.oracles.contains(oracle))
    }

    /// Distinct oracles that reported `status`
    pub fn tally(&self, status: StatusCode) -> usize {
        self.responses
            .iter()
            .find(|b| b.status == status)
            .map(|b| b.oracles.len())
            .unwrap_or(0)
    }

    fn record(&mut self, oracle: AccountId, status: StatusCode) -> usize {
        match self.responses.iter_mut().find(|b| b.status == status) {
            Some(bucket) => {
                bucket.oracles.insert(oracle);
                bucket.oracles.len()
            }
            None => {
                self.responses.push(ResponseBucket {
                    status,
                    oracles: BTreeSet::from([oracle]),
                });
                1
            }
        }
    }
}

/// Result of opening a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OpenOutcome {
    Opened,
    /// An open request with the same key already exists and is kept
    AlreadyOpen,
    /// A closed request with the same key was replaced by a fresh one
    Reopened { previous: StatusCode },
}

/// Result of an accepted response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResponseOutcome {
    Recorded {
        status: StatusCode,
        agreeing: usize,
        required: usize,
    },
    Finalized {
        status: StatusCode,
        agreeing: usize,
    },
}

#[derive(Debug)]
pub struct StatusRequestBook {
    requests: HashMap<RequestKey, StatusRequest>,
    quorum: ResponseQuorum,
}

impl StatusRequestBook {
    pub fn new(quorum: ResponseQuorum) -> Self {
        Self {
            requests: HashMap::new(),
            quorum,
        }
    }

    pub(crate) fn restore(requests: Vec<StatusRequest>, quorum: ResponseQuorum) -> Self {
        Self {
            requests: requests.into_iter().map(|r| (r.key.clone(), r)).collect(),
            quorum,
        }
    }

    pub fn open(
        &mut self,
        _live: Live<'_>,
        key: RequestKey,
        requester: AccountId,
        now: i64,
    ) -> OpenOutcome {
        let outcome = match self.requests.get(&key).map(|r| r.state) {
            Some(RequestState::Open) => return OpenOutcome::AlreadyOpen,
            Some(RequestState::Closed { status }) => OpenOutcome::Reopened { previous: status },
            None => OpenOutcome::Opened,
        };

        self.requests
            .insert(key.clone(), StatusRequest::new(key, requester, now));
        outcome
    }

    /// Validate a response and report what accepting it would do
    pub fn evaluate(
        &self,
        oracles: &OracleRegistry,
        key: &RequestKey,
        oracle: &AccountId,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        if !oracles.holds_index(oracle, key.index) {
            return Err(OracleError::CallerNotOracleForIndex {
                oracle: *oracle,
                index: key.index,
            }
            .into());
        }

        let request = self.requests.get(key).ok_or_else(|| OracleError::StatusRequestNotFound {
            index: key.index,
            flight: key.flight.to_string(),
        })?;
        if !request.is_open() {
            return Err(OracleError::RequestAlreadyClosed {
                index: key.index,
                flight: key.flight.to_string(),
            }
            .into());
        }
        if request.has_responded(oracle) {
            return Err(OracleError::DuplicateResponse {
                oracle: *oracle,
                index: key.index,
            }
            .into());
        }

        let agreeing = request.tally(status) + 1;
        if self.quorum.is_reached(agreeing) {
            Ok(ResponseOutcome::Finalized { status, agreeing })
        } else {
            Ok(ResponseOutcome::Recorded {
                status,
                agreeing,
                required: self.quorum.threshold(),
            })
        }
    }

    /// Apply a response already accepted by [`StatusRequestBook::evaluate`]
    pub(crate) fn commit(
        &mut self,
        _live: Live<'_>,
        key: &RequestKey,
        oracle: AccountId,
        outcome: ResponseOutcome,
    ) {
        let Some(request) = self.requests.get_mut(key) else {
            return;
        };

        match outcome {
            ResponseOutcome::Recorded { status, .. } => {
                request.record(oracle, status);
            }
            ResponseOutcome::Finalized { status, .. } => {
                request.record(oracle, status);
                request.state = RequestState::Closed { status };
            }
        }
        debug!(request = %key, oracle = %oracle, ?outcome, "Oracle response recorded");
    }

    /// Validate and apply a response in one step
    pub fn submit(
        &mut self,
        live: Live<'_>,
        oracles: &OracleRegistry,
        key: &RequestKey,
        oracle: AccountId,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        let outcome = self.evaluate(oracles, key, &oracle, status)?;
        self.commit(live, key, oracle, outcome);
        Ok(outcome)
    }

    pub fn get(&self, key: &RequestKey) -> Option<&StatusRequest> {
        self.requests.get(key)
    }

    pub fn quorum(&self) -> ResponseQuorum {
        self.quorum
    }

    /// All requests, ordered by key
    pub fn requests(&self) -> Vec<StatusRequest> {
        let mut requests: Vec<_> = self.requests.values().cloned().collect();
        requests.sort_by(|a, b| a.key.cmp(&b.key));
        requests
    }
}
