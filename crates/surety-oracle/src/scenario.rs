//! Demo scenario: bootstrap a ledger, drive fetch rounds, settle

use crate::config::OracleSimConfig;
use crate::responder::{Responder, ResponderStats};
use anyhow::{bail, Context, Result};
use surety_common::{AccountId, Amount, FlightKey, StatusCode};
use surety_ledger::{Admission, SuretyLedger};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// Flight departures are scheduled this far after bootstrap
const DEPARTURE_OFFSET_SECS: i64 = 24 * 3_600;

/// Accounts created by [`bootstrap`]
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    pub airlines: Vec<AccountId>,
    pub flights: Vec<FlightKey>,
    pub passengers: Vec<AccountId>,
    pub oracles: Vec<AccountId>,
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct Summary {
    pub stats: ResponderStats,
    pub statuses: Vec<(FlightKey, StatusCode)>,
    pub payouts: Vec<(AccountId, Amount)>,
}

/// Fund and admit airlines, list flights, sell insurance, register oracles
pub fn bootstrap(ledger: &mut SuretyLedger, cfg: &OracleSimConfig) -> Result<Fleet> {
    let fund = ledger.config().participation_fund;
    let fee = ledger.config().registration_fee;
    let premium = Amount::from_units(cfg.premium).context("premium is out of range")?;

    let mut fleet = Fleet::default();
    let genesis = ledger.config().first_airline;
    ledger.fund(genesis, fund)?;
    fleet.airlines.push(genesis);

    for n in 2..=cfg.airline_count {
        let candidate = AccountId::derive(&format!("airline-{}", n));
        admit(ledger, &fleet.airlines, candidate)?;
        ledger.fund(candidate, fund)?;
        fleet.airlines.push(candidate);
    }

    let departure = ledger.now() + DEPARTURE_OFFSET_SECS;
    for (n, airline) in fleet.airlines.iter().enumerate() {
        let flight = FlightKey::new(*airline, format!("SR{}", 100 + n), departure);
        ledger.register_flight(*airline, flight.clone())?;
        fleet.flights.push(flight);
    }

    for n in 0..cfg.passenger_count {
        let passenger = AccountId::derive(&format!("passenger-{}", n));
        let flight = fleet.flights[n % fleet.flights.len()].clone();
        ledger.buy(passenger, flight, premium)?;
        fleet.passengers.push(passenger);
    }

    for n in 0..cfg.oracle_count {
        let oracle = AccountId::derive(&format!("oracle-{}", n));
        let indexes = ledger.register_oracle(oracle, fee)?;
        info!(oracle = %oracle, ?indexes, "Oracle ready");
        fleet.oracles.push(oracle);
    }

    info!(
        airlines = fleet.airlines.len(),
        flights = fleet.flights.len(),
        passengers = fleet.passengers.len(),
        oracles = fleet.oracles.len(),
        "Bootstrap complete"
    );
    Ok(fleet)
}

/// Bring `candidate` in, collecting votes from `members` once voting applies
fn admit(ledger: &mut SuretyLedger, members: &[AccountId], candidate: AccountId) -> Result<()> {
    for voter in members {
        match ledger.register_airline(*voter, candidate)? {
            Admission::Registered | Admission::Elected { .. } | Admission::AlreadyRegistered => {
                return Ok(())
            }
            Admission::Pending { .. } => continue,
        }
    }
    bail!("airline {} was not admitted", candidate)
}

/// Run the whole demo against `ledger`
pub async fn run(mut ledger: SuretyLedger, cfg: &OracleSimConfig) -> Result<Summary> {
    let fleet = bootstrap(&mut ledger, cfg)?;

    let events = ledger.subscribe();
    let ledger = ledger.into_shared();
    let (report_tx, mut report_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let responder = Responder::new(ledger.clone(), fleet.oracles.clone(), cfg.seed);
    let handle = tokio::spawn(responder.run(events, report_tx, shutdown_rx));

    for round in 1..=cfg.rounds {
        // One OracleRequest event, and so one report, per fetch
        for flight in &fleet.flights {
            ledger
                .lock()
                .fetch_flight_status(flight.airline, flight.clone())?;
        }

        for _ in 0..fleet.flights.len() {
            let Some(report) = report_rx.recv().await else {
                bail!("responder stopped early");
            };
            info!(
                round,
                flight = %report.flight,
                index = report.index,
                accepted = report.accepted,
                rejected = report.rejected,
                finalized = ?report.finalized,
                "Request answered"
            );
        }
    }

    let _ = shutdown_tx.send(());
    let stats = handle.await.context("responder task failed")?;

    let mut ledger = ledger.lock();
    let statuses = fleet
        .flights
        .iter()
        .map(|flight| (flight.clone(), ledger.view_flight_status(flight)))
        .collect();

    let mut payouts = Vec::new();
    for passenger in &fleet.passengers {
        let credit = ledger.get_insuree_credit(passenger);
        info!(passenger = %passenger, credit = %credit, "Insuree credit");
        if !credit.is_zero() {
            payouts.push((*passenger, ledger.pay(*passenger)?));
        }
    }

    info!(
        held = %ledger.treasury().held(),
        paid_out = payouts.len(),
        "Simulation finished"
    );
    Ok(Summary {
        stats,
        statuses,
        payouts,
    })
}
