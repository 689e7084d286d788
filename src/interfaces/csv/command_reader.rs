use crate::domain::request::PaymentRequest;
use crate::domain::transaction::UserId;
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Submit,
    Verify,
    Process,
    Complete,
    Reject,
    Cancel,
}

/// One row of a batch file.
///
/// `tx` is a label local to the batch: a `submit` row binds it to the new
/// transaction and later rows refer to that transaction through it.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub command: CommandKind,
    pub user: String,
    pub tx: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub recipient_account_number: Option<String>,
    #[serde(default)]
    pub swift_code: Option<String>,
    #[serde(default)]
    pub recipient_bank_name: Option<String>,
    #[serde(default)]
    pub recipient_bank_address: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl CommandRecord {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.user.clone())
    }

    /// The payment fields of a `submit` row. Missing required columns become
    /// empty strings and fail validation like any other bad input.
    pub fn payment_request(&self) -> PaymentRequest {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        PaymentRequest {
            amount: text(&self.amount),
            currency: text(&self.currency),
            provider: self.provider.clone(),
            recipient_name: text(&self.recipient_name),
            recipient_account_number: text(&self.recipient_account_number),
            swift_code: text(&self.swift_code),
            recipient_bank_name: text(&self.recipient_bank_name),
            recipient_bank_address: self.recipient_bank_address.clone(),
            purpose: self.purpose.clone(),
            reference: self.reference.clone(),
        }
    }
}

/// Reads batch commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// so rows may omit trailing columns they do not use.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes commands, one `Result` per row.
    pub fn commands(self) -> impl Iterator<Item = Result<CommandRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
