//! Ledger store boundary.
//!
//! Durable storage for balance snapshots, inventory items and history entries.
//! Reads go straight to the store; every write happens inside a [`LedgerTx`],
//! which commits all of its writes together or none of them.
//!
//! ## Writer serialisation
//!
//! [`LedgerStore::begin`] hands out at most one open transaction at a time.
//! A second caller waits until the first commits or is dropped, so the
//! "read balance, then append snapshot" sequence of one operation can never
//! interleave with another's. Plain reads never wait on the writer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use shopledger_core::Money;
use shopledger_ledger::{BalanceSnapshot, HistoryEntry, InventoryItem, InventoryUpsert, NewHistoryEntry};

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No balance snapshot exists; the ledger was never seeded.
    #[error("ledger has no balance snapshot")]
    EmptyLedger,

    /// A uniqueness or check constraint refused the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A persisted value could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The backend failed (connection, IO, poisoned lock, ...).
    #[error("database error: {0}")]
    Database(String),
}

/// Read access plus transaction factory for the ledger tables.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Amount of the most recently appended balance snapshot.
    async fn latest_balance(&self) -> Result<Money, StoreError>;

    async fn find_inventory_item(&self, product_name: &str) -> Result<Option<InventoryItem>, StoreError>;

    /// All inventory items in insertion order.
    async fn all_inventory_items(&self) -> Result<Vec<InventoryItem>, StoreError>;

    /// All history entries in insertion order.
    async fn all_history_entries(&self) -> Result<Vec<HistoryEntry>, StoreError>;

    /// All balance snapshots in insertion order.
    async fn all_balance_snapshots(&self) -> Result<Vec<BalanceSnapshot>, StoreError>;

    /// Open the single write transaction, waiting for any open one to finish.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;

    /// Append `amount` as the first snapshot if the ledger has none.
    ///
    /// Returns whether a snapshot was written. Seeding records no history.
    async fn seed_opening_balance(&self, amount: Money) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;
        match tx.latest_balance().await {
            Ok(_) => Ok(false),
            Err(StoreError::EmptyLedger) => {
                tx.append_snapshot(amount).await?;
                tx.commit().await?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

/// An open write transaction.
///
/// Reads through the transaction observe its own uncommitted writes. Dropping
/// the transaction without calling [`LedgerTx::commit`] discards every write.
#[async_trait]
pub trait LedgerTx: Send {
    async fn latest_balance(&mut self) -> Result<Money, StoreError>;

    async fn find_inventory_item(&mut self, product_name: &str) -> Result<Option<InventoryItem>, StoreError>;

    async fn append_snapshot(&mut self, amount: Money) -> Result<BalanceSnapshot, StoreError>;

    /// Insert the item if its name is unknown, otherwise overwrite only its quantity.
    async fn upsert_inventory_item(&mut self, item: InventoryUpsert) -> Result<InventoryItem, StoreError>;

    async fn append_history(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn latest_balance(&self) -> Result<Money, StoreError> {
        (**self).latest_balance().await
    }

    async fn find_inventory_item(&self, product_name: &str) -> Result<Option<InventoryItem>, StoreError> {
        (**self).find_inventory_item(product_name).await
    }

    async fn all_inventory_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        (**self).all_inventory_items().await
    }

    async fn all_history_entries(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        (**self).all_history_entries().await
    }

    async fn all_balance_snapshots(&self) -> Result<Vec<BalanceSnapshot>, StoreError> {
        (**self).all_balance_snapshots().await
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        (**self).begin().await
    }

    async fn seed_opening_balance(&self, amount: Money) -> Result<bool, StoreError> {
        (**self).seed_opening_balance(amount).await
    }
}

/// Boxed future returned by a [`run_transaction`] body.
pub type TxFuture<'t, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 't>>;

/// Run `body` inside one write transaction.
///
/// Commits when `body` returns `Ok`; on `Err` the transaction is dropped and
/// none of the body's writes become visible.
pub async fn run_transaction<S, T, E, F>(store: &S, body: F) -> Result<T, E>
where
    S: LedgerStore + ?Sized,
    T: Send,
    E: From<StoreError> + Send,
    F: for<'t> FnOnce(&'t mut dyn LedgerTx) -> TxFuture<'t, T, E> + Send,
{
    let mut tx = store.begin().await?;
    let value = body(tx.as_mut()).await?;
    tx.commit().await?;
    Ok(value)
}
