use crate::domain::transaction::{TransactionId, TransactionStatus, TransitionKind};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// A single rule violation on one input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation failed: {}", join_fields(.fields))]
    ValidationFailed { fields: Vec<FieldError> },

    #[error("Daily limit of {limit} exceeded: attempted {attempted}, available {available}")]
    DailyLimitExceeded {
        limit: Decimal,
        attempted: Decimal,
        available: Decimal,
    },

    #[error("Cannot {attempted} transaction {transaction_id}: current status is {actual}")]
    InvalidStateTransition {
        transaction_id: TransactionId,
        attempted: TransitionKind,
        actual: TransactionStatus,
    },

    #[error("Persistence unavailable: {cause}")]
    PersistenceUnavailable { cause: String },

    #[error("Transaction {0} not found")]
    NotFound(TransactionId),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PaymentError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            fields: vec![FieldError::new(field, message)],
        }
    }

    pub fn persistence(cause: impl fmt::Display) -> Self {
        Self::PersistenceUnavailable {
            cause: cause.to_string(),
        }
    }

    /// Field errors carried by a `ValidationFailed`, empty for every other kind.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::ValidationFailed { fields } => fields,
            _ => &[],
        }
    }

    /// True when retrying the same call later may succeed without changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistenceUnavailable { .. })
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(e: rocksdb::Error) -> Self {
        Self::persistence(e)
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = PaymentError::ValidationFailed {
            fields: vec![
                FieldError::new("amount", "must be at most 100000.00"),
                FieldError::new("swiftCode", "must be 8 to 11 characters"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("amount: must be at most 100000.00"));
        assert!(msg.contains("swiftCode: must be 8 to 11 characters"));
        assert_eq!(err.field_errors().len(), 2);
    }

    #[test]
    fn test_daily_limit_message() {
        let err = PaymentError::DailyLimitExceeded {
            limit: dec!(50000.00),
            attempted: dec!(200.00),
            available: dec!(100.00),
        };
        assert_eq!(
            err.to_string(),
            "Daily limit of 50000.00 exceeded: attempted 200.00, available 100.00"
        );
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn test_only_persistence_errors_are_retryable() {
        assert!(PaymentError::persistence("timed out").is_retryable());
        assert!(!PaymentError::validation("amount", "bad").is_retryable());
    }
}
