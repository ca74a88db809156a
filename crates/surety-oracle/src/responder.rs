//! Simulated oracle fleet answering status requests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use surety_common::{AccountId, FlightKey, StatusCode};
use surety_ledger::{EventEnvelope, LedgerEvent, ResponseOutcome, SharedLedger};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// What the fleet did for one status request
#[derive(Debug, Clone)]
pub struct RequestReport {
    pub index: u8,
    pub flight: FlightKey,
    pub accepted: usize,
    pub rejected: usize,
    pub finalized: Option<StatusCode>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResponderStats {
    pub requests: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub finalized: usize,
}

impl ResponderStats {
    fn absorb(&mut self, report: &RequestReport) {
        self.requests += 1;
        self.accepted += report.accepted;
        self.rejected += report.rejected;
        if report.finalized.is_some() {
            self.finalized += 1;
        }
    }
}

pub struct Responder {
    ledger: SharedLedger,
    oracles: Vec<AccountId>,
    rng: StdRng,
}

impl Responder {
    pub fn new(ledger: SharedLedger, oracles: Vec<AccountId>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ledger,
            oracles,
            rng,
        }
    }

    /// Drain ledger events until shutdown, answering every `OracleRequest`
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<EventEnvelope>,
        reports: mpsc::UnboundedSender<RequestReport>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> ResponderStats {
        let mut stats = ResponderStats::default();

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                envelope = events.recv() => {
                    let Some(envelope) = envelope else { break };
                    if let LedgerEvent::OracleRequest { index, flight } = envelope.event {
                        let report = self.answer(index, &flight);
                        stats.absorb(&report);
                        if reports.send(report).is_err() {
                            break;
                        }
                    }
                }
            }
        }

        info!(?stats, "Responder stopped");
        stats
    }

    /// Submit a random status from every oracle holding `index`
    fn answer(&mut self, index: u8, flight: &FlightKey) -> RequestReport {
        let mut report = RequestReport {
            index,
            flight: flight.clone(),
            accepted: 0,
            rejected: 0,
            finalized: None,
        };

        let mut ledger = self.ledger.lock();
        for oracle in &self.oracles {
            let holds = ledger
                .get_my_indexes(oracle)
                .is_some_and(|indexes| indexes.contains(&index));
            if !holds {
                continue;
            }

            let status = StatusCode::ALL[self.rng.gen_range(0..StatusCode::ALL.len())];
            match ledger.submit_oracle_response(*oracle, index, flight.clone(), status) {
                Ok(ResponseOutcome::Finalized { status, agreeing }) => {
                    report.accepted += 1;
                    report.finalized = Some(status);
                    info!(flight = %flight, index, status = %status, agreeing, "Status agreed");
                }
                Ok(ResponseOutcome::Recorded { agreeing, .. }) => {
                    report.accepted += 1;
                    debug!(oracle = %oracle, index, status = %status, agreeing, "Response recorded");
                }
                Err(err) if err.code() == "RequestAlreadyClosed" => {
                    report.rejected += 1;
                    debug!(oracle = %oracle, index, "Request already closed");
                }
                // A refetch that lands on an open request is announced again
                Err(err) if err.code() == "DuplicateResponse" => {
                    report.rejected += 1;
                    debug!(oracle = %oracle, index, "Already answered");
                }
                Err(err) => {
                    report.rejected += 1;
                    warn!(oracle = %oracle, index, code = err.code(), error = %err, "Response rejected");
                }
            }
        }

        report
    }
}
