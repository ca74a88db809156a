//! AccountId - 20-byte account identity for owners, airlines, passengers, and oracles
//!
//! Key custody and address derivation belong to the caller's wallet; the
//! ledger only needs a comparable, hashable identity that round-trips through
//! configuration and snapshots as a `0x`-prefixed hex string.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Length of an account address in bytes
pub const ACCOUNT_ID_LEN: usize = 20;

/// Account identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId([u8; ACCOUNT_ID_LEN]);

impl AccountId {
    /// The all-zero address
    pub const ZERO: AccountId = AccountId([0u8; ACCOUNT_ID_LEN]);

    /// Wrap raw address bytes
    pub const fn from_bytes(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic address from a human-readable label
    ///
    /// Takes the first 20 bytes of the blake3 digest of the label. Used by
    /// fixtures and the oracle simulator to name accounts without key
    /// material.
    ///
    /// # Example
    /// ```
    /// use surety_common::types::account::AccountId;
    ///
    /// let a = AccountId::derive("airline-1");
    /// assert_eq!(a, AccountId::derive("airline-1"));
    /// assert_ne!(a, AccountId::derive("airline-2"));
    /// ```
    pub fn derive(label: &str) -> Self {
        let digest = blake3::hash(label.as_bytes());
        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        bytes.copy_from_slice(&digest.as_bytes()[..ACCOUNT_ID_LEN]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountId({})", self.to_hex())
    }
}

/// Errors related to AccountId parsing
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid address length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(stripped).map_err(|e| AccountIdError::InvalidHex(e.to_string()))?;

        if decoded.len() != ACCOUNT_ID_LEN {
            return Err(AccountIdError::InvalidLength {
                expected: ACCOUNT_ID_LEN,
                actual: decoded.len(),
            });
        }

        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = AccountId::derive("passenger-1");
        let b = AccountId::derive("passenger-1");
        assert_eq!(a, b);
        assert_ne!(a, AccountId::derive("passenger-2"));
        assert_ne!(a, AccountId::ZERO);
    }

    #[test]
    fn test_hex_parse() {
        let a = AccountId::derive("owner");
        let parsed: AccountId = a.to_hex().parse().unwrap();
        assert_eq!(parsed, a);

        // Prefix is optional
        let bare = &a.to_hex()[2..];
        assert_eq!(bare.parse::<AccountId>().unwrap(), a);
    }

    #[test]
    fn test_invalid_length() {
        let err = "0xdeadbeef".parse::<AccountId>().unwrap_err();
        assert_eq!(
            err,
            AccountIdError::InvalidLength {
                expected: 20,
                actual: 4
            }
        );
        assert!(matches!(
            "0xnothex".parse::<AccountId>(),
            Err(AccountIdError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let a = AccountId::derive("oracle-7");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"{}\"", a.to_hex()));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
