//! Transaction execution pipeline.
//!
//! The `TransactionEngine` applies one ledger command as one store transaction:
//!
//! ```text
//! Command (already validated by its constructor)
//!   ↓
//! 1. Open the write transaction (waits for any other writer)
//!   ↓
//! 2. Read current balance + the touched inventory row through it
//!   ↓
//! 3. Decide (pure, shopledger_ledger::decide) -> writes or rejection
//!   ↓
//! 4. Upsert inventory row, append history entry, append balance snapshot
//!   ↓
//! 5. Commit
//! ```
//!
//! A rejection or any failure before step 5 drops the transaction, so the
//! ledger is left exactly as it was. Nothing is retried.

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use shopledger_core::{DomainError, Money};
use shopledger_ledger::{
    decide, AdjustBalance, BalanceSnapshot, HistoryEntry, InventoryItem, LedgerCommand, LedgerError, Purchase,
    Rejection, Sale,
};

use crate::store::{run_transaction, LedgerStore, LedgerTx, StoreError};

#[derive(Debug, Error)]
pub enum TransactionError {
    /// A business rule refused the command (user-recoverable).
    #[error(transparent)]
    Rejected(Rejection),

    /// Malformed input or arithmetic out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The ledger was never seeded with an opening balance.
    #[error("ledger has no balance snapshot")]
    EmptyLedger,

    /// A storage constraint refused the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store failed; nothing was written.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for TransactionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::EmptyLedger => TransactionError::EmptyLedger,
            StoreError::Conflict(msg) => TransactionError::Conflict(msg),
            other => TransactionError::Store(other),
        }
    }
}

impl From<DomainError> for TransactionError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => TransactionError::Validation(msg),
        }
    }
}

impl From<Rejection> for TransactionError {
    fn from(value: Rejection) -> Self {
        TransactionError::Rejected(value)
    }
}

impl From<LedgerError> for TransactionError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::Rejected(r) => r.into(),
            LedgerError::Domain(e) => e.into(),
        }
    }
}

/// Records written by one accepted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub new_balance: Money,
    pub snapshot: BalanceSnapshot,
    pub history_entry: HistoryEntry,
    /// The inventory row after the write (purchases and sales only).
    pub item: Option<InventoryItem>,
}

/// Applies purchases, sales and balance adjustments atomically.
#[derive(Debug, Clone)]
pub struct TransactionEngine<S> {
    store: S,
}

impl<S> TransactionEngine<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn purchase(&self, cmd: Purchase) -> Result<Applied, TransactionError> {
        self.execute(cmd.into()).await
    }

    pub async fn sale(&self, cmd: Sale) -> Result<Applied, TransactionError> {
        self.execute(cmd.into()).await
    }

    pub async fn adjust_balance(&self, cmd: AdjustBalance) -> Result<Applied, TransactionError> {
        self.execute(cmd.into()).await
    }

    #[instrument(skip(self), fields(operation = operation_name(&command)))]
    pub async fn execute(&self, command: LedgerCommand) -> Result<Applied, TransactionError> {
        let outcome = run_transaction(&self.store, move |tx| {
            Box::pin(async move { apply_command(tx, &command).await })
        })
        .await;

        match &outcome {
            Ok(applied) => info!(
                balance = %applied.new_balance,
                snapshot_id = %applied.snapshot.id,
                history_id = %applied.history_entry.id,
                "transaction applied"
            ),
            Err(TransactionError::Rejected(reason)) => warn!(%reason, "transaction rejected"),
            Err(TransactionError::Validation(reason)) => warn!(%reason, "transaction invalid"),
            Err(e) => error!(error = %e, "transaction failed"),
        }

        outcome
    }
}

fn operation_name(command: &LedgerCommand) -> &'static str {
    match command {
        LedgerCommand::Purchase(_) => "purchase",
        LedgerCommand::Sale(_) => "sale",
        LedgerCommand::AdjustBalance(_) => "adjust_balance",
    }
}

async fn apply_command(tx: &mut dyn LedgerTx, command: &LedgerCommand) -> Result<Applied, TransactionError> {
    let balance = tx.latest_balance().await?;
    let current_item = match command.product_name() {
        Some(name) => tx.find_inventory_item(name).await?,
        None => None,
    };

    let change = decide(command, balance, current_item.as_ref())?;

    let item = match change.inventory {
        Some(upsert) => Some(tx.upsert_inventory_item(upsert).await?),
        None => None,
    };
    let history_entry = tx.append_history(change.history).await?;
    let snapshot = tx.append_snapshot(change.new_balance).await?;

    Ok(Applied {
        new_balance: snapshot.amount,
        snapshot,
        history_entry,
        item,
    })
}
