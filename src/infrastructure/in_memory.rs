use crate::domain::ports::{StatusUpdate, TransactionStore};
use crate::domain::transaction::{
    Transaction, TransactionId, TransactionStatus, Transition, UserId,
};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for transactions.
///
/// Uses `Arc<RwLock<HashMap<TransactionId, Transaction>>>` for shared concurrent
/// access. The write lock makes `update_status` an atomic compare-and-swap.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, tx: Transaction) -> Result<Transaction> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn find_by_id(&self, id: TransactionId, user_id: &UserId) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .get(&id)
            .filter(|tx| &tx.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut owned: Vec<Transaction> = transactions
            .values()
            .filter(|tx| &tx.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn sum_amount_for_user_in_range(
        &self,
        user_id: &UserId,
        statuses: &[TransactionStatus],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Decimal> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|tx| &tx.user_id == user_id)
            .filter(|tx| statuses.contains(&tx.status))
            .filter(|tx| tx.created_at >= start && tx.created_at < end)
            .map(|tx| tx.amount.value())
            .sum())
    }

    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        transition: &Transition,
        at: DateTime<Utc>,
    ) -> Result<StatusUpdate> {
        let mut transactions = self.transactions.write().await;
        let tx = transactions
            .get_mut(&id)
            .ok_or(PaymentError::NotFound(id))?;

        if tx.status != expected {
            return Ok(StatusUpdate::Conflict { actual: tx.status });
        }
        tx.apply(transition, at)?;
        Ok(StatusUpdate::Updated(tx.clone()))
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut all: Vec<Transaction> = transactions.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}
