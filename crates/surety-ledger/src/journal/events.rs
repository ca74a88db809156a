//! Ledger events and the in-memory journal
//!
//! Every committed state change appends one or more events. Failed calls
//! append nothing. Subscribers receive each envelope over an unbounded tokio
//! channel; this is how the external oracle process learns of new status
//! requests.

use crate::config::DEFAULT_JOURNAL_RETENTION;
use crate::consensus::OracleIndexes;
use serde::{Deserialize, Serialize};
use surety_common::{AccountId, Amount, FlightKey, StatusCode};
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

/// Event types recorded by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LedgerEvent {
    OperatingStatusChanged {
        operational: bool,
    },
    AirlineFunded {
        airline: AccountId,
        amount: Amount,
        total: Amount,
    },
    AirlineVoteCast {
        candidate: AccountId,
        voter: AccountId,
        votes: usize,
        required: usize,
    },
    AirlineRegistered {
        airline: AccountId,
        sponsor: AccountId,
        votes: usize,
    },
    FlightRegistered {
        flight: FlightKey,
    },
    InsurancePurchased {
        passenger: AccountId,
        flight: FlightKey,
        amount: Amount,
        total: Amount,
    },
    OracleRegistered {
        oracle: AccountId,
        indexes: OracleIndexes,
    },
    /// A status request was opened; oracles holding `index` should answer
    OracleRequest {
        index: u8,
        flight: FlightKey,
    },
    /// An oracle response was accepted
    OracleReport {
        index: u8,
        flight: FlightKey,
        oracle: AccountId,
        status: StatusCode,
    },
    /// A status request reached quorum
    FlightStatusInfo {
        index: u8,
        flight: FlightKey,
        status: StatusCode,
    },
    InsureesCredited {
        flight: FlightKey,
        insurees: usize,
        total: Amount,
    },
    InsureePaid {
        passenger: AccountId,
        amount: Amount,
    },
}

/// Journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    /// Position in the journal, starting at 1
    pub sequence: u64,
    /// Ledger time in unix seconds
    pub recorded_at: i64,
    pub event: LedgerEvent,
}

/// Event log with live fan-out
///
/// Only the newest `retention` entries stay in memory. Sequence numbers keep
/// counting across dropped entries, and subscribers see every event.
#[derive(Debug)]
pub struct EventJournal {
    entries: Vec<EventEnvelope>,
    subscribers: Vec<mpsc::UnboundedSender<EventEnvelope>>,
    retention: usize,
    next_sequence: u64,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::with_retention(DEFAULT_JOURNAL_RETENTION)
    }
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal holding at most `retention` entries (at least one)
    pub fn with_retention(retention: usize) -> Self {
        Self {
            entries: Vec::new(),
            subscribers: Vec::new(),
            retention: retention.max(1),
            next_sequence: 1,
        }
    }

    pub fn record(&mut self, event: LedgerEvent, now: i64) -> &EventEnvelope {
        let envelope = EventEnvelope {
            id: Uuid::now_v7(),
            sequence: self.next_sequence,
            recorded_at: now,
            event,
        };
        self.next_sequence += 1;

        // Drop subscribers whose receiver is gone
        self.subscribers
            .retain(|tx| tx.send(envelope.clone()).is_ok());

        if self.entries.len() >= self.retention {
            let excess = self.entries.len() + 1 - self.retention;
            self.entries.drain(..excess);
            trace!(dropped = excess, "Journal trimmed");
        }
        self.entries.push(envelope);
        &self.entries[self.entries.len() - 1]
    }

    /// Receive every event recorded from now on
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EventEnvelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn entries(&self) -> &[EventEnvelope] {
        &self.entries
    }

    /// Retained entries with a sequence number greater than `sequence`
    pub fn since(&self, sequence: u64) -> &[EventEnvelope] {
        let Some(first) = self.entries.first() else {
            return &[];
        };
        let skip = sequence.saturating_sub(first.sequence - 1);
        let start = (skip as usize).min(self.entries.len());
        &self.entries[start..]
    }

    /// Sequence number the next event will carry
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
