use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Number of fractional digits every monetary value is scaled to.
pub const CURRENCY_SCALE: u32 = 2;

/// A positive monetary amount scaled to two fractional digits.
///
/// Wraps `rust_decimal::Decimal` so that amounts, fees and totals can never be
/// zero, negative or carry sub-cent precision once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(PaymentError::validation(
                "amount",
                "must be greater than zero",
            ));
        }
        if value.normalize().scale() > CURRENCY_SCALE {
            return Err(PaymentError::validation(
                "amount",
                "must have at most 2 decimal places",
            ));
        }

        let mut scaled = value;
        scaled.rescale(CURRENCY_SCALE);
        Ok(Self(scaled))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Self;

    // Both operands are positive and 2-dp scaled, so the sum is too.
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
