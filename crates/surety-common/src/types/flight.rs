//! Flight identity and status codes

use super::account::AccountId;
use serde::{Deserialize, Serialize};

/// Flight status as established by oracle consensus
///
/// Discriminants are the wire values reported by oracles.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StatusCode {
    #[default]
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl StatusCode {
    /// Every status an oracle may report, in wire order
    pub const ALL: [StatusCode; 6] = [
        StatusCode::Unknown,
        StatusCode::OnTime,
        StatusCode::LateAirline,
        StatusCode::LateWeather,
        StatusCode::LateTechnical,
        StatusCode::LateOther,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Delay attributable to the airline itself
    pub fn is_airline_fault(self) -> bool {
        self == StatusCode::LateAirline
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        StatusCode::ALL
            .into_iter()
            .find(|code| code.as_u8() == value)
            .ok_or(value)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StatusCode::Unknown => "unknown",
            StatusCode::OnTime => "on-time",
            StatusCode::LateAirline => "late airline",
            StatusCode::LateWeather => "late weather",
            StatusCode::LateTechnical => "late technical",
            StatusCode::LateOther => "late other",
        };
        f.write_str(label)
    }
}

/// Flight key: (airline, flight code, departure timestamp in unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: AccountId,
    pub code: String,
    pub timestamp: i64,
}

impl FlightKey {
    pub fn new(airline: AccountId, code: impl Into<String>, timestamp: i64) -> Self {
        Self {
            airline,
            code: code.into(),
            timestamp,
        }
    }

    /// Canonical digest of the key, used to correlate log lines and events
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.airline.as_bytes());
        hasher.update(self.code.as_bytes());
        hasher.update(&self.timestamp.to_be_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Short hex form of [`FlightKey::digest`]
    pub fn short_id(&self) -> String {
        hex::encode(&self.digest()[..8])
    }
}

impl std::fmt::Display for FlightKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} ({})", self.code, self.timestamp, self.airline)
    }
}
