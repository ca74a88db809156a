//! Airline registry: participation funding and multi-party admission

use crate::consensus::quorum::{AdmissionQuorum, AdmissionRegime};
use crate::gate::Live;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use surety_common::{AccountId, AirlineError, Amount, Result, SuretyError};
use tracing::{debug, info};

/// Airline record
///
/// Accounts that have never funded nor been registered have no record and
/// read as the default (unregistered, zero funding).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    pub account: AccountId,
    pub registered: bool,
    pub funded_amount: Amount,
}

impl Airline {
    fn new(account: AccountId) -> Self {
        Self {
            account,
            registered: false,
            funded_amount: Amount::ZERO,
        }
    }
}

/// Result of a registration call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Admission {
    /// Registered directly during bootstrap
    Registered,
    /// Registered because this vote reached quorum
    Elected { votes: usize },
    /// Vote recorded, quorum not reached yet
    Pending { votes: usize, required: usize },
    /// Candidate was already registered; nothing changed
    AlreadyRegistered,
}

/// Votes accumulated by one pending candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateVotes {
    pub candidate: AccountId,
    pub voters: BTreeSet<AccountId>,
}

/// Registry of airlines, their funding, and pending admission votes
#[derive(Debug)]
pub struct AirlineRegistry {
    airlines: HashMap<AccountId, Airline>,
    candidate_votes: HashMap<AccountId, BTreeSet<AccountId>>,
    registered_count: usize,
    participation_fund: Amount,
    quorum: AdmissionQuorum,
}

impl AirlineRegistry {
    /// New registry with `genesis` already registered (unfunded)
    pub fn new(genesis: AccountId, participation_fund: Amount, quorum: AdmissionQuorum) -> Self {
        let mut registry = Self {
            airlines: HashMap::new(),
            candidate_votes: HashMap::new(),
            registered_count: 0,
            participation_fund,
            quorum,
        };
        registry.admit(genesis);
        registry
    }

    pub(crate) fn restore(
        airlines: Vec<Airline>,
        votes: Vec<CandidateVotes>,
        participation_fund: Amount,
        quorum: AdmissionQuorum,
    ) -> Self {
        let registered_count = airlines.iter().filter(|a| a.registered).count();
        Self {
            airlines: airlines.into_iter().map(|a| (a.account, a)).collect(),
            candidate_votes: votes
                .into_iter()
                .map(|v| (v.candidate, v.voters))
                .collect(),
            registered_count,
            participation_fund,
            quorum,
        }
    }

    /// Contribute toward the participation fund
    ///
    /// A contribution that would take the running total above the fund is
    /// rejected whole. Returns the new total.
    pub fn fund(&mut self, _live: Live<'_>, airline: AccountId, amount: Amount) -> Result<Amount> {
        if amount.is_zero() {
            return Err(SuretyError::InvalidAmount);
        }

        let funded = self.funded_amount(&airline);
        let total = funded.checked_add(amount).ok_or(SuretyError::Overflow)?;
        if total > self.participation_fund {
            return Err(AirlineError::FundingExceedsCap {
                funded,
                attempted: amount,
                cap: self.participation_fund,
            }
            .into());
        }

        self.airlines
            .entry(airline)
            .or_insert_with(|| Airline::new(airline))
            .funded_amount = total;

        debug!(airline = %airline, amount = %amount, total = %total, "Airline funded");
        Ok(total)
    }

    /// Register `candidate` on behalf of the funded airline `caller`
    ///
    /// Below the bootstrap size the call admits directly; from then on it
    /// counts as one vote, and the candidate is admitted once half of the
    /// currently registered airlines have voted for it.
    pub fn register_airline(
        &mut self,
        _live: Live<'_>,
        candidate: AccountId,
        caller: AccountId,
    ) -> Result<Admission> {
        if !self.is_funded(&caller) {
            return Err(AirlineError::CallerNotFunded { caller }.into());
        }

        if self.is_airline(&candidate) {
            return Ok(Admission::AlreadyRegistered);
        }

        match self.quorum.regime(self.registered_count) {
            AdmissionRegime::Direct => {
                self.admit(candidate);
                info!(candidate = %candidate, sponsor = %caller, "Airline registered");
                Ok(Admission::Registered)
            }
            AdmissionRegime::Consensus => self.vote(candidate, caller),
        }
    }

    fn vote(&mut self, candidate: AccountId, voter: AccountId) -> Result<Admission> {
        let already_voted = self
            .candidate_votes
            .get(&candidate)
            .is_some_and(|voters| voters.contains(&voter));
        if already_voted {
            return Err(AirlineError::DuplicateVote { voter, candidate }.into());
        }

        let voters = self.candidate_votes.entry(candidate).or_default();
        voters.insert(voter);
        let votes = voters.len();

        let registered = self.registered_count;
        if self.quorum.is_reached(votes, registered) {
            self.candidate_votes.remove(&candidate);
            self.admit(candidate);
            info!(candidate = %candidate, votes, registered, "Airline elected");
            return Ok(Admission::Elected { votes });
        }

        let required = self.quorum.required_votes(registered);
        debug!(candidate = %candidate, voter = %voter, votes, required, "Admission vote recorded");
        Ok(Admission::Pending { votes, required })
    }

    fn admit(&mut self, account: AccountId) {
        let airline = self
            .airlines
            .entry(account)
            .or_insert_with(|| Airline::new(account));
        if !airline.registered {
            airline.registered = true;
            self.registered_count += 1;
        }
    }

    pub fn is_airline(&self, account: &AccountId) -> bool {
        self.airlines.get(account).is_some_and(|a| a.registered)
    }

    /// Registered and holding exactly the participation fund
    pub fn is_funded(&self, account: &AccountId) -> bool {
        self.airlines
            .get(account)
            .is_some_and(|a| a.registered && a.funded_amount == self.participation_fund)
    }

    pub fn funded_amount(&self, account: &AccountId) -> Amount {
        self.airlines
            .get(account)
            .map(|a| a.funded_amount)
            .unwrap_or_default()
    }

    pub fn get(&self, account: &AccountId) -> Option<&Airline> {
        self.airlines.get(account)
    }

    pub fn registered_count(&self) -> usize {
        self.registered_count
    }

    /// Current regime, recomputed from the registered count
    pub fn regime(&self) -> AdmissionRegime {
        self.quorum.regime(self.registered_count)
    }

    /// Voters endorsing a still-pending candidate
    pub fn votes_for(&self, candidate: &AccountId) -> Vec<AccountId> {
        self.candidate_votes
            .get(candidate)
            .map(|voters| voters.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn participation_fund(&self) -> Amount {
        self.participation_fund
    }

    /// All records, ordered by account
    pub fn airlines(&self) -> Vec<Airline> {
        let mut airlines: Vec<_> = self.airlines.values().cloned().collect();
        airlines.sort_by_key(|a| a.account);
        airlines
    }

    /// Pending vote sets, ordered by candidate
    pub fn pending_votes(&self) -> Vec<CandidateVotes> {
        let mut votes: Vec<_> = self
            .candidate_votes
            .iter()
            .map(|(candidate, voters)| CandidateVotes {
                candidate: *candidate,
                voters: voters.clone(),
            })
            .collect();
        votes.sort_by_key(|v| v.candidate);
        votes
    }
}
