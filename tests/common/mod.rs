#![allow(dead_code)]

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;
use wirepay::application::service::PaymentService;
use wirepay::config::{DayBoundary, PaymentConfig};
use wirepay::domain::money::Amount;
use wirepay::domain::request::PaymentRequest;
use wirepay::domain::transaction::{
    Currency, Provider, Transaction, TransactionId, TransactionStatus, UserId,
};
use wirepay::infrastructure::in_memory::InMemoryTransactionStore;

pub const HEADER: &str = "command,user,tx,amount,currency,provider,recipient_name,recipient_account_number,swift_code,recipient_bank_name,recipient_bank_address,purpose,reference,reason";

pub fn service() -> PaymentService {
    service_with(PaymentConfig::default())
}

pub fn service_with(config: PaymentConfig) -> PaymentService {
    PaymentService::new(Box::new(InMemoryTransactionStore::new()), config)
        .expect("valid config")
}

/// A service sharing `store`, so tests can seed records behind its back.
pub fn service_on(store: &InMemoryTransactionStore, config: PaymentConfig) -> PaymentService {
    PaymentService::new(Box::new(store.clone()), config).expect("valid config")
}

pub fn utc_config() -> PaymentConfig {
    PaymentConfig {
        day_boundary: DayBoundary::Utc,
        ..Default::default()
    }
}

pub fn request(amount: &str) -> PaymentRequest {
    PaymentRequest {
        amount: amount.to_string(),
        currency: "USD".to_string(),
        recipient_name: "John Smith".to_string(),
        recipient_account_number: "ABCD12345678".to_string(),
        swift_code: "chasus33".to_string(),
        recipient_bank_name: "Chase Bank".to_string(),
        ..Default::default()
    }
}

/// A stored record with arbitrary status and creation time.
pub fn seeded(
    user: &str,
    amount: Decimal,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
) -> Transaction {
    let amount = Amount::new(amount).expect("positive amount");
    let fees = Amount::new(Decimal::from(15)).expect("positive fee");
    Transaction {
        id: TransactionId::new(),
        user_id: UserId::new(user),
        amount,
        currency: Currency::Usd,
        provider: Provider::Swift,
        recipient_name: "John Smith".to_string(),
        recipient_account_number: "ABCD12345678".to_string(),
        swift_code: "CHASUS33".to_string(),
        recipient_bank_name: "Chase Bank".to_string(),
        recipient_bank_address: None,
        purpose: None,
        reference: None,
        fees,
        total_amount: amount + fees,
        status,
        verification_code: "ABC234".to_string(),
        created_at,
        verified_at: None,
        processed_at: None,
        completed_at: None,
        rejected_at: None,
        cancelled_at: None,
        rejection_reason: None,
    }
}

pub fn write_batch(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "{}", HEADER).expect("write header");
    for row in rows {
        writeln!(file, "{}", row).expect("write row");
    }
    file
}
