//! The ledger facade
//!
//! [`SuretyLedger`] owns every component and applies each caller command as
//! one atomic step: all checks run before the first mutation, so a failed
//! call leaves state and the journal untouched.

use crate::clock::{Clock, SystemClock};
use crate::config::SuretyConfig;
use crate::consensus::{
    AdmissionQuorum, FetchTicket, OracleConsensus, OracleIndexes, OracleRegistry,
    RequestKey, ResponseOutcome, ResponseQuorum, StatusRequest, StatusRequestBook,
};
use crate::gate::OperationalGate;
use crate::insurance::{InsuranceLedger, Settlement, Treasury};
use crate::journal::{EventEnvelope, EventJournal, LedgerEvent, LedgerSnapshot};
use crate::registry::{Admission, Airline, AirlineRegistry, Flight, FlightRegistry};
use parking_lot::Mutex;
use std::sync::Arc;
use surety_common::{AccountId, Amount, FlightKey, Result, StatusCode};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

/// Ledger shared between tasks
pub type SharedLedger = Arc<Mutex<SuretyLedger>>;

#[derive(Debug)]
pub struct SuretyLedger {
    config: SuretyConfig,
    gate: OperationalGate,
    airlines: AirlineRegistry,
    flights: FlightRegistry,
    insurance: InsuranceLedger,
    treasury: Treasury,
    oracles: OracleConsensus,
    journal: EventJournal,
    clock: Arc<dyn Clock>,
}

impl SuretyLedger {
    /// Fresh ledger with `config.first_airline` registered
    pub fn new(config: SuretyConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let gate = OperationalGate::new(config.owner);
        let airlines = AirlineRegistry::new(
            config.first_airline,
            config.participation_fund,
            AdmissionQuorum::new(config.consensus_threshold),
        );
        let oracles = OracleConsensus::new(
            OracleRegistry::new(config.registration_fee, config.oracle_index_space),
            StatusRequestBook::new(ResponseQuorum::new(config.min_responses)),
            config.rng_seed,
        );

        info!(
            owner = %config.owner,
            first_airline = %config.first_airline,
            policy = ?config.payout_policy,
            "Surety ledger created"
        );

        Ok(Self {
            insurance: InsuranceLedger::new(config.insurance_pay_limit, config.payout_policy),
            flights: FlightRegistry::new(),
            treasury: Treasury::new(),
            journal: EventJournal::with_retention(config.journal_retention),
            gate,
            airlines,
            oracles,
            config,
            clock,
        })
    }

    pub fn with_system_clock(config: SuretyConfig) -> Result<Self> {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Rebuild a ledger from a snapshot
    ///
    /// Ownership comes from the snapshot; parameters come from `config`. The
    /// journal starts empty.
    pub fn restore(
        config: SuretyConfig,
        snapshot: LedgerSnapshot,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let oracles = OracleConsensus::new(
            OracleRegistry::restore(
                snapshot.oracles,
                config.registration_fee,
                config.oracle_index_space,
            ),
            StatusRequestBook::restore(
                snapshot.status_requests,
                ResponseQuorum::new(config.min_responses),
            ),
            config.rng_seed,
        );

        let ledger = Self {
            gate: OperationalGate::restore(snapshot.owner, snapshot.operational),
            airlines: AirlineRegistry::restore(
                snapshot.airlines,
                snapshot.candidate_votes,
                config.participation_fund,
                AdmissionQuorum::new(config.consensus_threshold),
            ),
            flights: FlightRegistry::restore(snapshot.flights),
            insurance: InsuranceLedger::restore(
                snapshot.policies,
                snapshot.credits,
                config.insurance_pay_limit,
                config.payout_policy,
            ),
            treasury: snapshot.treasury,
            journal: EventJournal::with_retention(config.journal_retention),
            oracles,
            config,
            clock,
        };

        info!(
            airlines = ledger.airlines.registered_count(),
            flights = ledger.flights.len(),
            oracles = ledger.oracles.oracles().len(),
            "Surety ledger restored"
        );
        Ok(ledger)
    }

    pub fn into_shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    // ---- Operational gate ----

    pub fn is_operational(&self) -> bool {
        self.gate.is_operational()
    }

    pub fn set_operational(&mut self, caller: AccountId, mode: bool) -> Result<()> {
        if self.gate.set_operational(&caller, mode)? {
            self.journal.record(
                LedgerEvent::OperatingStatusChanged { operational: mode },
                self.clock.now(),
            );
        }
        Ok(())
    }

    // ---- Airlines ----

    /// Contribute `amount` toward `caller`'s participation fund
    #[instrument(skip(self))]
    pub fn fund(&mut self, caller: AccountId, amount: Amount) -> Result<Amount> {
        let live = self.gate.live()?;
        self.treasury.ensure_can_deposit(amount)?;

        let total = self.airlines.fund(live, caller, amount)?;
        self.treasury.deposit(live, amount)?;

        self.journal.record(
            LedgerEvent::AirlineFunded {
                airline: caller,
                amount,
                total,
            },
            self.clock.now(),
        );
        Ok(total)
    }

    #[instrument(skip(self))]
    pub fn register_airline(&mut self, caller: AccountId, candidate: AccountId) -> Result<Admission> {
        let live = self.gate.live()?;
        let admission = self.airlines.register_airline(live, candidate, caller)?;

        let now = self.clock.now();
        match admission {
            Admission::Registered => {
                self.journal.record(
                    LedgerEvent::AirlineRegistered {
                        airline: candidate,
                        sponsor: caller,
                        votes: 0,
                    },
                    now,
                );
            }
            Admission::Elected { votes } => {
                self.journal.record(
                    LedgerEvent::AirlineVoteCast {
                        candidate,
                        voter: caller,
                        votes,
                        required: votes,
                    },
                    now,
                );
                self.journal.record(
                    LedgerEvent::AirlineRegistered {
                        airline: candidate,
                        sponsor: caller,
                        votes,
                    },
                    now,
                );
            }
            Admission::Pending { votes, required } => {
                self.journal.record(
                    LedgerEvent::AirlineVoteCast {
                        candidate,
                        voter: caller,
                        votes,
                        required,
                    },
                    now,
                );
            }
            Admission::AlreadyRegistered => {
                debug!(candidate = %candidate, "Candidate already registered");
            }
        }
        Ok(admission)
    }

    pub fn is_airline(&self, account: &AccountId) -> bool {
        self.airlines.is_airline(account)
    }

    pub fn registered_airline_count(&self) -> usize {
        self.airlines.registered_count()
    }

    pub fn airline(&self, account: &AccountId) -> Option<&Airline> {
        self.airlines.get(account)
    }

    pub fn votes_for(&self, candidate: &AccountId) -> Vec<AccountId> {
        self.airlines.votes_for(candidate)
    }

    // ---- Flights ----

    #[instrument(skip(self))]
    pub fn register_flight(&mut self, caller: AccountId, key: FlightKey) -> Result<()> {
        let live = self.gate.live()?;
        let now = self.clock.now();
        self.flights
            .register_flight(live, &self.airlines, key.clone(), now, caller)?;

        self.journal
            .record(LedgerEvent::FlightRegistered { flight: key }, now);
        Ok(())
    }

    /// Current status; `Unknown` for flights never registered
    pub fn view_flight_status(&self, key: &FlightKey) -> StatusCode {
        self.flights.view_flight_status(key)
    }

    pub fn flight(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    // ---- Insurance ----

    #[instrument(skip(self))]
    pub fn buy(&mut self, passenger: AccountId, key: FlightKey, amount: Amount) -> Result<Amount> {
        let live = self.gate.live()?;
        self.treasury.ensure_can_deposit(amount)?;

        let total = self
            .insurance
            .buy(live, &self.flights, passenger, &key, amount)?;
        self.treasury.deposit(live, amount)?;

        self.journal.record(
            LedgerEvent::InsurancePurchased {
                passenger,
                flight: key,
                amount,
                total,
            },
            self.clock.now(),
        );
        Ok(total)
    }

    /// Credit the insurees of a flight under its current status
    #[instrument(skip(self))]
    pub fn credit_insurees(&mut self, key: &FlightKey) -> Result<Settlement> {
        let live = self.gate.live()?;
        let settlement = self
            .insurance
            .credit_insurees(live, &mut self.flights, key)?;

        self.record_settlement(key, &settlement);
        Ok(settlement)
    }

    #[instrument(skip(self))]
    pub fn pay(&mut self, passenger: AccountId) -> Result<Amount> {
        let live = self.gate.live()?;
        let amount = self.insurance.pay(live, passenger, &mut self.treasury)?;

        self.journal.record(
            LedgerEvent::InsureePaid { passenger, amount },
            self.clock.now(),
        );
        Ok(amount)
    }

    pub fn get_insuree_credit(&self, passenger: &AccountId) -> Amount {
        self.insurance.get_insuree_credit(passenger)
    }

    /// Cumulative premium paid by `passenger` on `key`
    pub fn policy(&self, passenger: &AccountId, key: &FlightKey) -> Amount {
        self.insurance.policy_amount(passenger, key)
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    // ---- Oracles ----

    #[instrument(skip(self))]
    pub fn register_oracle(&mut self, caller: AccountId, fee_paid: Amount) -> Result<OracleIndexes> {
        let live = self.gate.live()?;
        self.treasury.ensure_can_deposit(fee_paid)?;

        let indexes = self.oracles.register_oracle(live, caller, fee_paid)?;
        self.treasury.deposit(live, fee_paid)?;

        self.journal.record(
            LedgerEvent::OracleRegistered {
                oracle: caller,
                indexes,
            },
            self.clock.now(),
        );
        Ok(indexes)
    }

    pub fn get_my_indexes(&self, caller: &AccountId) -> Option<OracleIndexes> {
        self.oracles.oracles().get_my_indexes(caller)
    }

    pub fn is_oracle(&self, account: &AccountId) -> bool {
        self.oracles.oracles().is_oracle(account)
    }

    /// Ask the oracles for a flight's status
    ///
    /// Every successful fetch emits an `OracleRequest` event. Drawing an
    /// index whose request is still open keeps that request and its tally.
    #[instrument(skip(self))]
    pub fn fetch_flight_status(&mut self, caller: AccountId, key: FlightKey) -> Result<FetchTicket> {
        let live = self.gate.live()?;
        let now = self.clock.now();
        let ticket = self
            .oracles
            .fetch_flight_status(live, &self.flights, &key, caller, now)?;

        self.journal.record(
            LedgerEvent::OracleRequest {
                index: ticket.key.index,
                flight: key,
            },
            now,
        );
        Ok(ticket)
    }

    /// Record one oracle's report
    ///
    /// When the report completes a quorum the flight's status is set and
    /// its insurees are credited in the same step.
    #[instrument(skip(self))]
    pub fn submit_oracle_response(
        &mut self,
        caller: AccountId,
        index: u8,
        flight: FlightKey,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        let live = self.gate.live()?;
        let key = RequestKey::new(index, flight);

        let outcome = self.oracles.evaluate_response(&key, &caller, status)?;
        let settlement = match outcome {
            ResponseOutcome::Finalized { status, .. } => Some(self.insurance.plan_settlement(
                &self.flights,
                &key.flight,
                status,
            )?),
            ResponseOutcome::Recorded { .. } => None,
        };

        self.oracles.commit_response(live, &key, caller, outcome);
        let now = self.clock.now();
        self.journal.record(
            LedgerEvent::OracleReport {
                index,
                flight: key.flight.clone(),
                oracle: caller,
                status,
            },
            now,
        );

        if let Some(settlement) = settlement {
            self.flights.set_status(live, &key.flight, status)?;
            self.insurance
                .apply_settlement(live, &mut self.flights, &key.flight, &settlement)?;

            info!(request = %key, status = %status, "Flight status agreed");
            self.journal.record(
                LedgerEvent::FlightStatusInfo {
                    index,
                    flight: key.flight.clone(),
                    status,
                },
                now,
            );
            self.record_settlement(&key.flight, &settlement);
        }
        Ok(outcome)
    }

    pub fn status_request(&self, index: u8, key: &FlightKey) -> Option<&StatusRequest> {
        self.oracles
            .requests()
            .get(&RequestKey::new(index, key.clone()))
    }

    fn record_settlement(&mut self, key: &FlightKey, settlement: &Settlement) {
        if let Settlement::Credited { payouts, total } = settlement {
            self.journal.record(
                LedgerEvent::InsureesCredited {
                    flight: key.clone(),
                    insurees: payouts.len(),
                    total: *total,
                },
                self.clock.now(),
            );
        }
    }

    // ---- Journal and snapshots ----

    /// Receive every event recorded from now on
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EventEnvelope> {
        self.journal.subscribe()
    }

    /// Retained journal entries, oldest first
    pub fn events(&self) -> &[EventEnvelope] {
        self.journal.entries()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            owner: self.gate.owner(),
            operational: self.gate.is_operational(),
            airlines: self.airlines.airlines(),
            candidate_votes: self.airlines.pending_votes(),
            flights: self.flights.flights(),
            policies: self.insurance.policies(),
            credits: self.insurance.credit_balances(),
            oracles: self.oracles.oracles().oracles(),
            status_requests: self.oracles.requests().requests(),
            treasury: self.treasury.clone(),
            taken_at: self.clock.now(),
        }
    }

    pub fn config(&self) -> &SuretyConfig {
        &self.config
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    const NOW: i64 = 1_700_000_000;

    fn ledger() -> SuretyLedger {
        let config = SuretyConfig {
            rng_seed: Some(5),
            ..SuretyConfig::default()
        };
        SuretyLedger::new(config, Arc::new(FixedClock::new(NOW))).unwrap()
    }

    #[test]
    fn test_genesis_airline_registered_unfunded() {
        let ledger = ledger();
        let first = ledger.config().first_airline;

        assert!(ledger.is_operational());
        assert!(ledger.is_airline(&first));
        assert_eq!(ledger.registered_airline_count(), 1);
        assert_eq!(ledger.airline(&first).unwrap().funded_amount, Amount::ZERO);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_journal_keeps_configured_window() {
        let config = SuretyConfig {
            journal_retention: 2,
            ..SuretyConfig::default()
        };
        let owner = config.owner;
        let mut ledger = SuretyLedger::new(config, Arc::new(FixedClock::new(NOW))).unwrap();
        let mut rx = ledger.subscribe();

        for mode in [false, true, false, true] {
            ledger.set_operational(owner, mode).unwrap();
        }

        let sequences: Vec<_> = ledger.events().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![3, 4]);
        // Subscribers still see every event
        let mut seen = 0;
        while rx.try_recv().is_ok() {
            seen += 1;
        }
        assert_eq!(seen, 4);
    }

    #[test]
    fn test_failed_call_records_nothing() {
        let mut ledger = ledger();
        let first = ledger.config().first_airline;

        let err = ledger
            .register_airline(first, AccountId::derive("airline-2"))
            .unwrap_err();
        assert_eq!(err.code(), "CallerNotFunded");

        let over = ledger.config().participation_fund.checked_add(Amount::from_base(1)).unwrap();
        let err = ledger.fund(first, over).unwrap_err();
        assert_eq!(err.code(), "FundingExceedsCap");

        assert!(ledger.events().is_empty());
        assert_eq!(ledger.treasury().held(), Amount::ZERO);
    }

    #[test]
    fn test_paused_ledger_rejects_mutations() {
        let mut ledger = ledger();
        let owner = ledger.config().owner;
        let first = ledger.config().first_airline;

        let err = ledger.set_operational(first, false).unwrap_err();
        assert_eq!(err.code(), "Unauthorized");

        ledger.set_operational(owner, false).unwrap();
        let fund = ledger.config().participation_fund;
        assert_eq!(ledger.fund(first, fund).unwrap_err().code(), "SystemPaused");
        assert_eq!(ledger.pay(first).unwrap_err().code(), "SystemPaused");

        // Reads stay available
        assert!(ledger.is_airline(&first));

        ledger.set_operational(owner, true).unwrap();
        ledger.fund(first, fund).unwrap();
        assert_eq!(ledger.events().len(), 3);
    }
}
