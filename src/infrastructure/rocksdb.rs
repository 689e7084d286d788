use crate::domain::ports::{StatusUpdate, TransactionStore};
use crate::domain::transaction::{
    Transaction, TransactionId, TransactionStatus, Transition, UserId,
};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing transactions, keyed by the 16 id bytes.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent store implementation using RocksDB.
///
/// Values are JSON-encoded `Transaction`s. RocksDB has no conditional write, so
/// status updates hold `write_guard` for the read-compare-write sequence. The
/// guard moves into the blocking task and is released only when the write
/// finishes, even if the caller stopped waiting.
///
/// Every DB call runs on the blocking pool, so a caller's timeout can give up
/// on a slow read or write without stalling the async worker.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions])?;

        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    /// Runs `op` against the database on tokio's blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&DB) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| PaymentError::persistence(format!("RocksDB task failed: {}", e)))?
    }
}

fn cf(db: &DB) -> Result<&ColumnFamily> {
    db.cf_handle(CF_TRANSACTIONS)
        .ok_or_else(|| PaymentError::persistence("Transactions column family not found"))
}

fn put(db: &DB, tx: &Transaction) -> Result<()> {
    let value = serde_json::to_vec(tx)
        .map_err(|e| PaymentError::persistence(format!("Serialization error: {}", e)))?;
    db.put_cf(cf(db)?, tx.id.as_bytes(), value)?;
    Ok(())
}

fn load(db: &DB, id: TransactionId) -> Result<Option<Transaction>> {
    match db.get_cf(cf(db)?, id.as_bytes())? {
        Some(bytes) => decode(&bytes).map(Some),
        None => Ok(None),
    }
}

fn scan(db: &DB) -> Result<Vec<Transaction>> {
    let mut transactions = Vec::new();
    for item in db.iterator_cf(cf(db)?, IteratorMode::Start) {
        let (_key, value) = item?;
        transactions.push(decode(&value)?);
    }
    Ok(transactions)
}

fn decode(bytes: &[u8]) -> Result<Transaction> {
    serde_json::from_slice(bytes)
        .map_err(|e| PaymentError::persistence(format!("Deserialization error: {}", e)))
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn create(&self, tx: Transaction) -> Result<Transaction> {
        let guard = Arc::clone(&self.write_guard).lock_owned().await;
        self.blocking(move |db| {
            let _guard = guard;
            put(db, &tx)?;
            Ok(tx)
        })
        .await
    }

    async fn find_by_id(&self, id: TransactionId, user_id: &UserId) -> Result<Option<Transaction>> {
        let user_id = user_id.clone();
        self.blocking(move |db| Ok(load(db, id)?.filter(|tx| tx.user_id == user_id)))
            .await
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        let user_id = user_id.clone();
        self.blocking(move |db| {
            let mut owned: Vec<Transaction> = scan(db)?
                .into_iter()
                .filter(|tx| tx.user_id == user_id)
                .collect();
            owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(owned)
        })
        .await
    }

    async fn sum_amount_for_user_in_range(
        &self,
        user_id: &UserId,
        statuses: &[TransactionStatus],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Decimal> {
        let user_id = user_id.clone();
        let statuses = statuses.to_vec();
        self.blocking(move |db| {
            Ok(scan(db)?
                .into_iter()
                .filter(|tx| tx.user_id == user_id && statuses.contains(&tx.status))
                .filter(|tx| tx.created_at >= start && tx.created_at < end)
                .map(|tx| tx.amount.value())
                .sum())
        })
        .await
    }

    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        transition: &Transition,
        at: DateTime<Utc>,
    ) -> Result<StatusUpdate> {
        let guard = Arc::clone(&self.write_guard).lock_owned().await;
        let transition = transition.clone();
        self.blocking(move |db| {
            let _guard = guard;
            let mut tx = load(db, id)?.ok_or(PaymentError::NotFound(id))?;
            if tx.status != expected {
                return Ok(StatusUpdate::Conflict { actual: tx.status });
            }
            tx.apply(&transition, at)?;
            put(db, &tx)?;
            Ok(StatusUpdate::Updated(tx))
        })
        .await
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        self.blocking(|db| {
            let mut all = scan(db)?;
            all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(all)
        })
        .await
    }
}
