//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.
//!
//! Amounts are persisted as integer minor units (two decimal places) and
//! exchange rates as integer micros (six decimal places), so storage never
//! has to round-trip a decimal type.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept for stored monetary amounts.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Decimal places kept for stored exchange rates.
pub const RATE_SCALE: u32 = 6;

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g. `12.50`).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "USD", "INR").
    pub currency: CurrencyCode,
}

/// A validated ISO 4217 alphabetic currency code.
///
/// Companies pick their currency from a country list supplied by an external
/// reference service, so the set of codes is open-ended; only the shape
/// (three ASCII letters) is enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Parses a currency code, normalising to upper case.
    pub fn parse(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(format!("Invalid currency code: {s}"));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

/// Converts an amount to integer minor units, rounding half to even.
///
/// Returns `None` if the value does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    scale_to_i64(amount, MINOR_UNIT_SCALE)
}

/// Rebuilds a decimal amount from integer minor units.
#[must_use]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// Converts an exchange rate to integer micros, rounding half to even.
#[must_use]
pub fn rate_to_micros(rate: Decimal) -> Option<i64> {
    scale_to_i64(rate, RATE_SCALE)
}

/// Rebuilds an exchange rate from integer micros.
#[must_use]
pub fn rate_from_micros(micros: i64) -> Decimal {
    Decimal::new(micros, RATE_SCALE)
}

fn scale_to_i64(value: Decimal, scale: u32) -> Option<i64> {
    let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    let factor = Decimal::from(10_i64.checked_pow(scale)?);
    rounded.checked_mul(factor)?.trunc().to_i64()
}
