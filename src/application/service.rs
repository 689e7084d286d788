use super::window::{DayWindow, day_window};
use crate::config::PaymentConfig;
use crate::domain::money::Amount;
use crate::domain::ports::{StatusUpdate, TransactionStoreBox};
use crate::domain::request::{PaymentRequest, ValidatedPayment};
use crate::domain::transaction::{
    Transaction, TransactionId, TransactionStatus, Transition, UserId,
};
use crate::domain::validation::{validate_payment, validate_rejection_reason};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const VERIFICATION_CODE_LEN: usize = 6;

// No 0/O or 1/I, the code is read out loud.
const VERIFICATION_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub fn generate_verification_code() -> String {
    let mut rng = rand::thread_rng();
    (0..VERIFICATION_CODE_LEN)
        .map(|_| VERIFICATION_ALPHABET[rng.gen_range(0..VERIFICATION_ALPHABET.len())] as char)
        .collect()
}

/// How much of the daily limit a user has consumed in the current window.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyUsage {
    pub limit: Decimal,
    pub used: Decimal,
    pub available: Decimal,
    pub window: DayWindow,
}

/// Validates payment submissions and drives transactions through their
/// lifecycle.
///
/// Submissions from the same user are serialized for the duration of the
/// daily-limit check and the insert, so the limit holds for every caller
/// sharing this instance. Separate processes writing to the same store can
/// still race past it. Status changes rely on the store's compare-and-swap.
pub struct PaymentService {
    store: TransactionStoreBox,
    config: PaymentConfig,
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl PaymentService {
    /// Creates a new `PaymentService`.
    ///
    /// # Arguments
    ///
    /// * `store` - The store for transaction records.
    /// * `config` - Amount bounds, fee tiers and the daily limit. Rejected if invalid.
    pub fn new(store: TransactionStoreBox, config: PaymentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            user_locks: DashMap::new(),
        })
    }

    /// Validates `request`, checks the daily limit and persists a new PENDING
    /// transaction owned by `user`.
    pub async fn submit(&self, user: &UserId, request: &PaymentRequest) -> Result<Transaction> {
        let payment = validate_payment(request, &self.config).inspect_err(|e| {
            warn!(target: "audit", user = %user, error = %e, "payment request rejected");
        })?;
        let fees = self.config.fee_tiers.fee_for(payment.amount)?;

        let created = {
            let lease = self.lease_user_lock(user);
            let _guard = lease.lock.lock().await;
            self.create_within_limit(user, payment, fees).await?
        };
        info!(
            target: "audit",
            user = %user,
            transaction_id = %created.id,
            amount = %created.amount,
            currency = %created.currency,
            total = %created.total_amount,
            "payment submitted"
        );
        Ok(created)
    }

    /// PENDING → VERIFIED.
    pub async fn verify(&self, user: &UserId, id: TransactionId) -> Result<Transaction> {
        self.transition(user, id, Transition::Verify).await
    }

    /// VERIFIED → PROCESSING. Stands in for the hand-off to the provider network.
    pub async fn begin_processing(&self, user: &UserId, id: TransactionId) -> Result<Transaction> {
        self.transition(user, id, Transition::BeginProcessing).await
    }

    /// PROCESSING → COMPLETED.
    pub async fn complete(&self, user: &UserId, id: TransactionId) -> Result<Transaction> {
        self.transition(user, id, Transition::Complete).await
    }

    /// PENDING | VERIFIED → REJECTED, administrator-initiated.
    pub async fn reject(&self, user: &UserId, id: TransactionId, reason: &str) -> Result<Transaction> {
        let reason = validate_rejection_reason(reason)?;
        self.transition(user, id, Transition::Reject { reason }).await
    }

    /// PENDING → CANCELLED, initiated by the owner.
    pub async fn cancel(&self, user: &UserId, id: TransactionId) -> Result<Transaction> {
        self.transition(user, id, Transition::Cancel).await
    }

    pub async fn get_transaction(&self, user: &UserId, id: TransactionId) -> Result<Transaction> {
        self.bounded("find_by_id", self.store.find_by_id(id, user))
            .await?
            .ok_or(PaymentError::NotFound(id))
    }

    pub async fn list_transactions(&self, user: &UserId) -> Result<Vec<Transaction>> {
        self.bounded("list_for_user", self.store.list_for_user(user))
            .await
    }

    pub async fn daily_usage(&self, user: &UserId) -> Result<DailyUsage> {
        self.usage_at(user, Utc::now()).await
    }

    /// Consumes the service and returns every stored transaction, oldest first.
    pub async fn into_transactions(self) -> Result<Vec<Transaction>> {
        self.bounded("all", self.store.all()).await
    }

    async fn create_within_limit(
        &self,
        user: &UserId,
        payment: ValidatedPayment,
        fees: Amount,
    ) -> Result<Transaction> {
        let now = Utc::now();
        let usage = self.usage_at(user, now).await?;
        let attempted = payment.amount.value();
        if usage.used + attempted > usage.limit {
            warn!(
                target: "audit",
                user = %user,
                used = %usage.used,
                attempted = %attempted,
                limit = %usage.limit,
                "daily limit exceeded"
            );
            return Err(PaymentError::DailyLimitExceeded {
                limit: usage.limit,
                attempted,
                available: usage.available,
            });
        }

        let tx = Transaction {
            id: TransactionId::new(),
            user_id: user.clone(),
            amount: payment.amount,
            currency: payment.currency,
            provider: payment.provider,
            recipient_name: payment.recipient_name,
            recipient_account_number: payment.recipient_account_number,
            swift_code: payment.swift_code,
            recipient_bank_name: payment.recipient_bank_name,
            recipient_bank_address: payment.recipient_bank_address,
            purpose: payment.purpose,
            reference: payment.reference,
            fees,
            total_amount: payment.amount + fees,
            status: TransactionStatus::Pending,
            verification_code: generate_verification_code(),
            created_at: now,
            verified_at: None,
            processed_at: None,
            completed_at: None,
            rejected_at: None,
            cancelled_at: None,
            rejection_reason: None,
        };
        self.bounded("create", self.store.create(tx)).await
    }

    async fn transition(
        &self,
        user: &UserId,
        id: TransactionId,
        transition: Transition,
    ) -> Result<Transaction> {
        let current = self.get_transaction(user, id).await?;
        if !transition.is_allowed_from(current.status) {
            warn!(
                target: "audit",
                user = %user,
                transaction_id = %id,
                attempted = %transition.kind(),
                status = %current.status,
                "illegal status transition"
            );
            return Err(PaymentError::InvalidStateTransition {
                transaction_id: id,
                attempted: transition.kind(),
                actual: current.status,
            });
        }

        let update = self.store.update_status(id, current.status, &transition, Utc::now());
        match self.bounded("update_status", update).await? {
            StatusUpdate::Updated(tx) => {
                info!(
                    target: "audit",
                    user = %user,
                    transaction_id = %id,
                    from = %current.status,
                    to = %tx.status,
                    "transaction status changed"
                );
                Ok(tx)
            }
            StatusUpdate::Conflict { actual } => {
                warn!(
                    target: "audit",
                    user = %user,
                    transaction_id = %id,
                    attempted = %transition.kind(),
                    expected = %current.status,
                    actual = %actual,
                    "lost status update race"
                );
                Err(PaymentError::InvalidStateTransition {
                    transaction_id: id,
                    attempted: transition.kind(),
                    actual,
                })
            }
        }
    }

    async fn usage_at(&self, user: &UserId, now: DateTime<Utc>) -> Result<DailyUsage> {
        let window = day_window(now, self.config.day_boundary);
        let used = self
            .bounded(
                "sum_amount_for_user_in_range",
                self.store.sum_amount_for_user_in_range(
                    user,
                    &TransactionStatus::COUNTED_TOWARDS_LIMIT,
                    window.start,
                    window.end,
                ),
            )
            .await?;
        let limit = self.config.daily_limit;
        debug!(user = %user, used = %used, limit = %limit, "daily usage computed");

        Ok(DailyUsage {
            limit,
            used,
            available: (limit - used).max(Decimal::ZERO),
            window,
        })
    }

    /// Runs a store call under the configured timeout.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let timeout = self.config.store_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = self.config.store_timeout_ms, "store call timed out");
                Err(PaymentError::PersistenceUnavailable {
                    cause: format!("{} timed out after {}ms", operation, timeout.as_millis()),
                })
            }
        }
    }

    fn lease_user_lock<'a>(&'a self, user: &'a UserId) -> UserLockLease<'a> {
        let lock = self.user_locks.entry(user.clone()).or_default().clone();
        UserLockLease {
            locks: &self.user_locks,
            user,
            lock,
        }
    }
}

/// A handle on one user's submission lock. Dropping it, including when the
/// submitting future is cancelled, removes the map entry once no other
/// submission holds or waits on it.
struct UserLockLease<'a> {
    locks: &'a DashMap<UserId, Arc<Mutex<()>>>,
    user: &'a UserId,
    lock: Arc<Mutex<()>>,
}

impl Drop for UserLockLease<'_> {
    fn drop(&mut self) {
        // The map's copy plus ours.
        self.locks
            .remove_if(self.user, |_, lock| Arc::strong_count(lock) <= 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryTransactionStore;
    use rust_decimal_macros::dec;

    fn service() -> PaymentService {
        PaymentService::new(
            Box::new(InMemoryTransactionStore::new()),
            PaymentConfig::default(),
        )
        .unwrap()
    }

    fn request(amount: &str) -> PaymentRequest {
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

    #[test]
    fn test_verification_code_shape() {
        let code = generate_verification_code();
        assert_eq!(code.len(), VERIFICATION_CODE_LEN);
        assert!(code.bytes().all(|b| VERIFICATION_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = PaymentConfig {
            daily_limit: dec!(0),
            ..Default::default()
        };
        let result = PaymentService::new(Box::new(InMemoryTransactionStore::new()), config);
        assert!(matches!(result, Err(PaymentError::Config(_))));
    }

    #[tokio::test]
    async fn test_submit_computes_fee_and_total() {
        let service = service();
        let user = UserId::new("alice");

        let tx = service.submit(&user, &request("500.00")).await.unwrap();
        assert_eq!(tx.fees.value(), dec!(15.00));
        assert_eq!(tx.total_amount.value(), dec!(515.00));
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.swift_code, "CHASUS33");
        assert_eq!(tx.user_id, user);
    }

    #[tokio::test]
    async fn test_validation_failure_persists_nothing() {
        let service = service();
        let user = UserId::new("alice");

        let err = service.submit(&user, &request("100001.00")).await.unwrap_err();
        assert_eq!(err.field_errors()[0].field, "amount");
        assert!(service.list_transactions(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_daily_usage_tracks_submissions() {
        let service = service();
        let user = UserId::new("alice");
        service.submit(&user, &request("1200.50")).await.unwrap();

        let usage = service.daily_usage(&user).await.unwrap();
        assert_eq!(usage.used, dec!(1200.50));
        assert_eq!(usage.available, dec!(48799.50));
        assert_eq!(usage.limit, dec!(50000.00));
    }

    #[tokio::test]
    async fn test_cancelled_submissions_free_the_limit() {
        let service = service();
        let user = UserId::new("alice");

        let big = service.submit(&user, &request("50000.00")).await.unwrap();
        assert!(matches!(
            service.submit(&user, &request("1.00")).await,
            Err(PaymentError::DailyLimitExceeded { .. })
        ));

        service.cancel(&user, big.id).await.unwrap();
        assert!(service.submit(&user, &request("1.00")).await.is_ok());
    }

    #[tokio::test]
    async fn test_user_locks_are_released() {
        let service = service();
        let user = UserId::new("alice");
        service.submit(&user, &request("10.00")).await.unwrap();
        assert!(service.user_locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_submit_releases_user_lock() {
        let service = service();
        let user = UserId::new("alice");

        let held = service.lease_user_lock(&user);
        let guard = held.lock.lock().await;
        let waiting = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            service.submit(&user, &request("10.00")),
        )
        .await;
        assert!(waiting.is_err());
        assert_eq!(service.user_locks.len(), 1);

        drop(guard);
        drop(held);
        assert!(service.user_locks.is_empty());
        assert!(service.list_transactions(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let service = service();
        let user = UserId::new("alice");
        let tx = service.submit(&user, &request("10.00")).await.unwrap();

        let err = service.reject(&user, tx.id, "  ").await.unwrap_err();
        assert_eq!(err.field_errors()[0].field, "reason");
        assert_eq!(
            service.get_transaction(&user, tx.id).await.unwrap().status,
            TransactionStatus::Pending
        );
    }
}
