//! Immutable payment policy, injected into the service at construction.
//!
//! Every field has a default so a partial JSON file only needs to name the
//! values it overrides.

use crate::domain::fees::FeeSchedule;
use crate::domain::transaction::{Currency, Provider};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Where the daily-limit window starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// Midnight in the server's local timezone.
    #[default]
    Local,
    /// Midnight UTC.
    Utc,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentConfig {
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub daily_limit: Decimal,
    pub fee_tiers: FeeSchedule,
    pub supported_currencies: Vec<Currency>,
    pub supported_providers: Vec<Provider>,
    pub day_boundary: DayBoundary,
    pub store_timeout_ms: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            min_amount: dec!(1.00),
            max_amount: dec!(100000.00),
            daily_limit: dec!(50000.00),
            fee_tiers: FeeSchedule::default(),
            supported_currencies: Currency::ALL.to_vec(),
            supported_providers: Provider::ALL.to_vec(),
            day_boundary: DayBoundary::Local,
            store_timeout_ms: 5_000,
        }
    }
}

impl PaymentConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| PaymentError::Config(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_amount <= Decimal::ZERO {
            return Err(PaymentError::Config("minAmount must be positive".into()));
        }
        if self.min_amount > self.max_amount {
            return Err(PaymentError::Config(
                "minAmount must not exceed maxAmount".into(),
            ));
        }
        if self.daily_limit <= Decimal::ZERO {
            return Err(PaymentError::Config("dailyLimit must be positive".into()));
        }
        if self.supported_currencies.is_empty() {
            return Err(PaymentError::Config(
                "supportedCurrencies must not be empty".into(),
            ));
        }
        if self.supported_providers.is_empty() {
            return Err(PaymentError::Config(
                "supportedProviders must not be empty".into(),
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(PaymentError::Config(
                "storeTimeoutMs must be greater than zero".into(),
            ));
        }
        self.fee_tiers.validate()
    }
}
