use super::money::Amount;
use super::transaction::{Currency, Provider};
use serde::Deserialize;

/// An inbound payment request as received from the outer layer.
///
/// Every field is a raw string; nothing here has been checked yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub provider: Option<String>,
    pub recipient_name: String,
    pub recipient_account_number: String,
    pub swift_code: String,
    pub recipient_bank_name: String,
    #[serde(default)]
    pub recipient_bank_address: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// A payment request whose fields passed every format and range rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayment {
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
}
