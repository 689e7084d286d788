use super::transaction::{Transaction, TransactionId, TransactionStatus, Transition, UserId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Outcome of a compare-and-swap status update.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// The stored status matched the expectation and the transition was applied.
    Updated(Transaction),
    /// The stored status no longer matched; nothing was written.
    Conflict { actual: TransactionStatus },
}

/// Persistence port for wire-transfer transactions.
///
/// Callers bound every call with a timeout, which can only fire at an await
/// point. Implementations backed by blocking I/O must run it off the async
/// worker, e.g. with `tokio::task::spawn_blocking`.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, tx: Transaction) -> Result<Transaction>;

    /// Returns the transaction only if it belongs to `user_id`.
    async fn find_by_id(&self, id: TransactionId, user_id: &UserId) -> Result<Option<Transaction>>;

    /// The user's transactions, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>>;

    /// Sums `amount` over the user's transactions in `statuses` whose
    /// `created_at` lies in `[start, end)`.
    async fn sum_amount_for_user_in_range(
        &self,
        user_id: &UserId,
        statuses: &[TransactionStatus],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Decimal>;

    /// Applies `transition` only if the stored status still equals `expected`.
    /// Fails with `NotFound` when `id` is unknown.
    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        transition: &Transition,
        at: DateTime<Utc>,
    ) -> Result<StatusUpdate>;

    async fn all(&self) -> Result<Vec<Transaction>>;
}

pub type TransactionStoreBox = Box<dyn TransactionStore>;
