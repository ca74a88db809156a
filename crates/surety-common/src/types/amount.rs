//! Amount - unsigned currency quantity in base units
//!
//! One whole currency unit is [`BASE_UNITS_PER_UNIT`] base units, the same
//! scale as wei per ether. All ledger
//! arithmetic is integer and checked; conversions to and from whole units go
//! through `rust_decimal` so configuration can say `10` instead of
//! `10000000000000000000`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of base-unit decimal places in one whole unit
pub const UNIT_DECIMALS: u32 = 18;

/// Base units per whole currency unit
pub const BASE_UNITS_PER_UNIT: u128 = 1_000_000_000_000_000_000;

/// Unsigned amount in base units
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_base(base_units: u128) -> Self {
        Self(base_units)
    }

    /// Whole units, e.g. `Amount::units(10)` for ten ether
    pub const fn units(whole: u128) -> Self {
        Self(whole * BASE_UNITS_PER_UNIT)
    }

    pub const fn base(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Multiply by `numerator / denominator`, rounding toward zero
    pub fn mul_ratio(self, numerator: u128, denominator: u128) -> Option<Amount> {
        if denominator == 0 {
            return None;
        }
        self.0
            .checked_mul(numerator)
            .map(|scaled| Amount(scaled / denominator))
    }

    /// Half of the amount, rounded down
    pub fn half(self) -> Amount {
        Amount(self.0 / 2)
    }

    /// Express the amount in whole units
    ///
    /// Returns `None` when the base-unit value does not fit a `Decimal`
    /// mantissa (about 7.9 * 10^28 base units).
    pub fn to_units(&self) -> Option<Decimal> {
        let mantissa = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, UNIT_DECIMALS).ok()
    }

    /// Build an amount from whole units, truncating below one base unit
    ///
    /// Negative values are rejected.
    pub fn from_units(units: Decimal) -> Option<Amount> {
        if units.is_sign_negative() {
            return None;
        }
        let scaled = units.checked_mul(Decimal::from(BASE_UNITS_PER_UNIT as u64))?;
        let base = scaled.trunc().mantissa() / 10i128.pow(scaled.trunc().scale());
        u128::try_from(base).ok().map(Amount)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0.to_string()
    }
}

impl TryFrom<String> for Amount {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Amount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().replace('_', "").parse::<u128>().map(Amount)
    }
}
