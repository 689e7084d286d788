use crate::domain::transaction::Transaction;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    id: String,
    user: &'a str,
    amount: String,
    currency: &'static str,
    provider: &'static str,
    fees: String,
    total_amount: String,
    status: &'static str,
    swift_code: &'a str,
    recipient_name: &'a str,
    verification_code: &'a str,
    created_at: String,
    rejection_reason: Option<&'a str>,
}

impl<'a> From<&'a Transaction> for TransactionRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            user: tx.user_id.as_str(),
            amount: tx.amount.to_string(),
            currency: tx.currency.code(),
            provider: tx.provider.code(),
            fees: tx.fees.to_string(),
            total_amount: tx.total_amount.to_string(),
            status: tx.status.as_str(),
            swift_code: &tx.swift_code,
            recipient_name: &tx.recipient_name,
            verification_code: &tx.verification_code,
            created_at: tx.created_at.to_rfc3339(),
            rejection_reason: tx.rejection_reason.as_deref(),
        }
    }
}

/// Writes transactions as CSV rows, one per transaction, with a header line.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        for tx in transactions {
            self.writer.serialize(TransactionRow::from(tx))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
