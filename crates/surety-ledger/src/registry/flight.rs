//! Flight registry

use super::airline::AirlineRegistry;
use crate::gate::Live;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use surety_common::{AccountId, FlightError, FlightKey, Result, StatusCode};
use tracing::{debug, info};

/// Registered flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub key: FlightKey,
    pub status: StatusCode,
    /// Set once insurees have been credited; never reset
    pub credited: bool,
    /// Ledger time at registration
    pub registered_at: i64,
    pub registered_by: AccountId,
}

#[derive(Debug, Default)]
pub struct FlightRegistry {
    flights: HashMap<FlightKey, Flight>,
}

impl FlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn restore(flights: Vec<Flight>) -> Self {
        Self {
            flights: flights.into_iter().map(|f| (f.key.clone(), f)).collect(),
        }
    }

    /// Register a future departure for a registered airline
    ///
    /// Admission, not funding, gates this: an unfunded but registered
    /// airline may list flights.
    pub fn register_flight(
        &mut self,
        _live: Live<'_>,
        airlines: &AirlineRegistry,
        key: FlightKey,
        now: i64,
        caller: AccountId,
    ) -> Result<&Flight> {
        if !airlines.is_airline(&key.airline) {
            return Err(FlightError::AirlineNotRegistered {
                airline: key.airline,
            }
            .into());
        }
        if key.timestamp <= now {
            return Err(FlightError::FlightInPast {
                timestamp: key.timestamp,
                now,
            }
            .into());
        }
        if self.flights.contains_key(&key) {
            return Err(FlightError::FlightAlreadyRegistered {
                flight: key.to_string(),
            }
            .into());
        }

        info!(flight = %key, id = %key.short_id(), by = %caller, "Flight registered");

        let flight = Flight {
            key: key.clone(),
            status: StatusCode::Unknown,
            credited: false,
            registered_at: now,
            registered_by: caller,
        };
        Ok(self.flights.entry(key).or_insert(flight))
    }

    /// Status of the flight; `Unknown` both for unregistered flights and
    /// registered ones without an agreed status
    pub fn view_flight_status(&self, key: &FlightKey) -> StatusCode {
        self.flights
            .get(key)
            .map(|f| f.status)
            .unwrap_or_default()
    }

    pub fn is_registered(&self, key: &FlightKey) -> bool {
        self.flights.contains_key(key)
    }

    pub fn get(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    /// Fail with `FlightNotRegistered` unless the key exists
    pub fn require(&self, key: &FlightKey) -> Result<&Flight> {
        self.flights.get(key).ok_or_else(|| {
            FlightError::FlightNotRegistered {
                flight: key.to_string(),
            }
            .into()
        })
    }

    /// Record an agreed status
    pub fn set_status(&mut self, _live: Live<'_>, key: &FlightKey, status: StatusCode) -> Result<()> {
        let flight = self.flights.get_mut(key).ok_or_else(|| FlightError::FlightNotRegistered {
            flight: key.to_string(),
        })?;

        debug!(flight = %key, from = %flight.status, to = %status, "Flight status updated");
        flight.status = status;
        Ok(())
    }

    /// Flip the credited flag; returns false if it was already set
    pub(crate) fn mark_credited(&mut self, _live: Live<'_>, key: &FlightKey) -> bool {
        match self.flights.get_mut(key) {
            Some(flight) if !flight.credited => {
                flight.credited = true;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    /// All flights, ordered by key
    pub fn flights(&self) -> Vec<Flight> {
        let mut flights: Vec<_> = self.flights.values().cloned().collect();
        flights.sort_by(|a, b| a.key.cmp(&b.key));
        flights
    }
}
