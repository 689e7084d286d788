use super::money::{Amount, CURRENCY_SCALE};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One step of the fee table: amounts up to and including `up_to` pay `fee`.
/// `up_to: None` marks the final, unbounded tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTier {
    pub up_to: Option<Decimal>,
    pub fee: Decimal,
}

impl FeeTier {
    pub fn bounded(up_to: Decimal, fee: Decimal) -> Self {
        Self {
            up_to: Some(up_to),
            fee,
        }
    }

    pub fn unbounded(fee: Decimal) -> Self {
        Self { up_to: None, fee }
    }
}

/// Flat-fee step function over the transfer amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeSchedule {
    tiers: Vec<FeeTier>,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            tiers: vec![
                FeeTier::bounded(dec!(1000.00), dec!(15.00)),
                FeeTier::bounded(dec!(10000.00), dec!(25.00)),
                FeeTier::unbounded(dec!(50.00)),
            ],
        }
    }
}

impl FeeSchedule {
    /// Builds a schedule after checking the tiers are usable.
    pub fn new(tiers: Vec<FeeTier>) -> Result<Self> {
        let schedule = Self { tiers };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Tiers must be strictly ascending, carry positive fees, and end with
    /// exactly one unbounded tier so every amount maps to a fee.
    pub fn validate(&self) -> Result<()> {
        let Some((last, bounded)) = self.tiers.split_last() else {
            return Err(PaymentError::Config("fee table must not be empty".into()));
        };
        if last.up_to.is_some() {
            return Err(PaymentError::Config(
                "last fee tier must be unbounded".into(),
            ));
        }

        let mut previous: Option<Decimal> = None;
        for tier in bounded {
            let Some(up_to) = tier.up_to else {
                return Err(PaymentError::Config(
                    "only the last fee tier may be unbounded".into(),
                ));
            };
            if previous.is_some_and(|p| up_to <= p) {
                return Err(PaymentError::Config(
                    "fee tier bounds must be strictly ascending".into(),
                ));
            }
            previous = Some(up_to);
        }

        if self.tiers.iter().any(|t| t.fee <= Decimal::ZERO) {
            return Err(PaymentError::Config("fees must be positive".into()));
        }
        if self
            .tiers
            .iter()
            .any(|t| t.fee.normalize().scale() > CURRENCY_SCALE)
        {
            return Err(PaymentError::Config(
                "fees must have at most 2 decimal places".into(),
            ));
        }
        Ok(())
    }

    /// Fee charged for transferring `amount`.
    pub fn fee_for(&self, amount: Amount) -> Result<Amount> {
        let value = amount.value();
        let tier = self
            .tiers
            .iter()
            .find(|t| t.up_to.is_none_or(|bound| value <= bound))
            .ok_or_else(|| PaymentError::Config("no fee tier covers the amount".into()))?;
        Amount::new(tier.fee)
    }
}
