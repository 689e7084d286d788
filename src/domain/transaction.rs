use super::money::Amount;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, immutable transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier of an authenticated principal, supplied by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Aud,
    Cad,
    Chf,
    Cny,
    Zar,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 10] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Aud,
        Currency::Cad,
        Currency::Chf,
        Currency::Cny,
        Currency::Zar,
        Currency::Inr,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
            Currency::Cny => "CNY",
            Currency::Zar => "ZAR",
            Currency::Inr => "INR",
        }
    }
}

impl FromStr for Currency {
    type Err = ();

    /// Matches the ISO code exactly; lowercase codes are not accepted.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or(())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
    #[default]
    Swift,
    Fedwire,
    Chips,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Swift, Provider::Fedwire, Provider::Chips];

    pub fn code(&self) -> &'static str {
        match self {
            Provider::Swift => "SWIFT",
            Provider::Fedwire => "FEDWIRE",
            Provider::Chips => "CHIPS",
        }
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.code() == s)
            .ok_or(())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Verified,
    Processing,
    Completed,
    Rejected,
    Cancelled,
}

impl TransactionStatus {
    /// Statuses whose amounts count towards the daily limit.
    pub const COUNTED_TOWARDS_LIMIT: [TransactionStatus; 4] = [
        TransactionStatus::Pending,
        TransactionStatus::Verified,
        TransactionStatus::Processing,
        TransactionStatus::Completed,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Rejected | TransactionStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Verified => "VERIFIED",
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Rejected => "REJECTED",
            TransactionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a transition, without its payload. Used for error reporting.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TransitionKind {
    Verify,
    BeginProcessing,
    Complete,
    Reject,
    Cancel,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransitionKind::Verify => "verify",
            TransitionKind::BeginProcessing => "begin processing",
            TransitionKind::Complete => "complete",
            TransitionKind::Reject => "reject",
            TransitionKind::Cancel => "cancel",
        })
    }
}

/// A requested status change.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Transition {
    Verify,
    BeginProcessing,
    Complete,
    Reject { reason: String },
    Cancel,
}

impl Transition {
    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::Verify => TransitionKind::Verify,
            Transition::BeginProcessing => TransitionKind::BeginProcessing,
            Transition::Complete => TransitionKind::Complete,
            Transition::Reject { .. } => TransitionKind::Reject,
            Transition::Cancel => TransitionKind::Cancel,
        }
    }

    pub fn target(&self) -> TransactionStatus {
        match self {
            Transition::Verify => TransactionStatus::Verified,
            Transition::BeginProcessing => TransactionStatus::Processing,
            Transition::Complete => TransactionStatus::Completed,
            Transition::Reject { .. } => TransactionStatus::Rejected,
            Transition::Cancel => TransactionStatus::Cancelled,
        }
    }

    pub fn is_allowed_from(&self, status: TransactionStatus) -> bool {
        use TransactionStatus::*;
        match self {
            Transition::Verify => status == Pending,
            Transition::BeginProcessing => status == Verified,
            Transition::Complete => status == Processing,
            Transition::Reject { .. } => matches!(status, Pending | Verified),
            Transition::Cancel => status == Pending,
        }
    }
}

/// A wire-transfer request that passed validation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: Amount,
    pub currency: Currency,
    pub provider: Provider,
    pub recipient_name: String,
    pub recipient_account_number: String,
    pub swift_code: String,
    pub recipient_bank_name: String,
    pub recipient_bank_address: Option<String>,
    pub purpose: Option<String>,
    pub reference: Option<String>,
    pub fees: Amount,
    pub total_amount: Amount,
    pub status: TransactionStatus,
    pub verification_code: String,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl Transaction {
    pub fn verify(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.apply(&Transition::Verify, at)
    }

    pub fn begin_processing(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.apply(&Transition::BeginProcessing, at)
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.apply(&Transition::Complete, at)
    }

    pub fn reject(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
        self.apply(
            &Transition::Reject {
                reason: reason.into(),
            },
            at,
        )
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.apply(&Transition::Cancel, at)
    }

    /// Moves the transaction along the state machine and stamps the matching
    /// timestamp. Leaves the record untouched when the transition is illegal.
    pub fn apply(&mut self, transition: &Transition, at: DateTime<Utc>) -> Result<()> {
        if !transition.is_allowed_from(self.status) {
            return Err(PaymentError::InvalidStateTransition {
                transaction_id: self.id,
                attempted: transition.kind(),
                actual: self.status,
            });
        }

        match transition {
            Transition::Verify => self.verified_at = Some(at),
            Transition::BeginProcessing => self.processed_at = Some(at),
            Transition::Complete => self.completed_at = Some(at),
            Transition::Reject { reason } => {
                self.rejected_at = Some(at);
                self.rejection_reason = Some(reason.clone());
            }
            Transition::Cancel => self.cancelled_at = Some(at),
        }
        self.status = transition.target();
        Ok(())
    }
}
