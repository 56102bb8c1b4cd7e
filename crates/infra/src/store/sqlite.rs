//! SQLite-backed ledger store.
//!
//! Schema:
//!
//! | table       | columns                                                   |
//! |-------------|-----------------------------------------------------------|
//! | `balance`   | `id`, `timestamp`, `amount`                               |
//! | `inventory` | `id`, `product_name` (UNIQUE), `unit_price`, `quantity`   |
//! | `history`   | `id`, `timestamp`, `transaction_type`, `history`          |
//!
//! Decimal amounts are stored as TEXT so no precision is lost. Ids come from
//! `INTEGER PRIMARY KEY AUTOINCREMENT` and therefore never go backwards.
//!
//! ## Error Mapping
//!
//! | SQLx error                          | StoreError |
//! |-------------------------------------|------------|
//! | Database (unique/check violation)   | `Conflict` |
//! | Database (other)                    | `Database` |
//! | ColumnDecode / Decode               | `Corrupt`  |
//! | PoolClosed and everything else      | `Database` |

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::instrument;

use shopledger_core::{Money, RecordId};
use shopledger_ledger::{
    BalanceSnapshot, HistoryEntry, InventoryItem, InventoryUpsert, NewHistoryEntry, TransactionKind,
};

use super::{LedgerStore, LedgerTx, StoreError};

/// SQLite ledger store.
///
/// `SqlitePool` is `Send + Sync`; the extra `writer` mutex serialises write
/// transactions inside this process so read-then-write sequences never race.
#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl SqliteLedgerStore {
    /// Connect to `database_url` (e.g. `sqlite://shop.db` or `sqlite::memory:`),
    /// creating the file and the tables if needed.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| map_sqlx_error("parse_url", e))?
            .create_if_missing(true);

        // An in-memory database lives and dies with its connection, so keep
        // exactly one and never recycle it.
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool. Call [`SqliteLedgerStore::ensure_schema`] before use.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Create the ledger tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS balance (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT    NOT NULL,
                amount    TEXT    NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS inventory (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                product_name TEXT    NOT NULL UNIQUE,
                unit_price   TEXT    NOT NULL,
                quantity     INTEGER NOT NULL CHECK (quantity >= 0)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp        TEXT    NOT NULL,
                transaction_type TEXT    NOT NULL,
                history          TEXT    NOT NULL
            )
            "#,
        ];

        for sql in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn latest_balance(&self) -> Result<Money, StoreError> {
        let row = sqlx::query("SELECT amount FROM balance ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("latest_balance", e))?;
        match row {
            Some(row) => parse_money(&row, "amount"),
            None => Err(StoreError::EmptyLedger),
        }
    }

    async fn find_inventory_item(&self, product_name: &str) -> Result<Option<InventoryItem>, StoreError> {
        let row = sqlx::query(
            "SELECT id, product_name, unit_price, quantity FROM inventory WHERE product_name = ?1",
        )
        .bind(product_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_inventory_item", e))?;
        row.as_ref().map(inventory_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn all_inventory_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = sqlx::query("SELECT id, product_name, unit_price, quantity FROM inventory ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("all_inventory_items", e))?;
        rows.iter().map(inventory_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn all_history_entries(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows = sqlx::query("SELECT id, timestamp, transaction_type, history FROM history ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("all_history_entries", e))?;
        rows.iter().map(history_from_row).collect()
    }

    async fn all_balance_snapshots(&self) -> Result<Vec<BalanceSnapshot>, StoreError> {
        let rows = sqlx::query("SELECT id, timestamp, amount FROM balance ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("all_balance_snapshots", e))?;
        rows.iter().map(snapshot_from_row).collect()
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let guard = self.writer.clone().lock_owned().await;
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(SqliteTx { tx, _writer: guard }))
    }
}

/// Open SQLite transaction plus the in-process writer lock.
///
/// Dropping it rolls the SQLite transaction back and releases the lock.
struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
    _writer: OwnedMutexGuard<()>,
}

#[async_trait]
impl LedgerTx for SqliteTx {
    async fn latest_balance(&mut self) -> Result<Money, StoreError> {
        let row = sqlx::query("SELECT amount FROM balance ORDER BY id DESC LIMIT 1")
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("latest_balance", e))?;
        match row {
            Some(row) => parse_money(&row, "amount"),
            None => Err(StoreError::EmptyLedger),
        }
    }

    async fn find_inventory_item(&mut self, product_name: &str) -> Result<Option<InventoryItem>, StoreError> {
        let row = sqlx::query(
            "SELECT id, product_name, unit_price, quantity FROM inventory WHERE product_name = ?1",
        )
        .bind(product_name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_inventory_item", e))?;
        row.as_ref().map(inventory_from_row).transpose()
    }

    async fn append_snapshot(&mut self, amount: Money) -> Result<BalanceSnapshot, StoreError> {
        let timestamp = Utc::now();
        let result = sqlx::query("INSERT INTO balance (timestamp, amount) VALUES (?1, ?2)")
            .bind(timestamp)
            .bind(amount.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("append_snapshot", e))?;

        Ok(BalanceSnapshot {
            id: RecordId::new(result.last_insert_rowid()),
            timestamp,
            amount,
        })
    }

    async fn upsert_inventory_item(&mut self, item: InventoryUpsert) -> Result<InventoryItem, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventory (product_name, unit_price, quantity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (product_name)
            DO UPDATE SET quantity = excluded.quantity
            "#,
        )
        .bind(&item.product_name)
        .bind(item.unit_price.to_string())
        .bind(item.quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_inventory_item", e))?;

        self.find_inventory_item(&item.product_name)
            .await?
            .ok_or_else(|| StoreError::Database(format!("row for {} vanished after upsert", item.product_name)))
    }

    async fn append_history(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        let timestamp = Utc::now();
        let result = sqlx::query(
            "INSERT INTO history (timestamp, transaction_type, history) VALUES (?1, ?2, ?3)",
        )
        .bind(timestamp)
        .bind(entry.transaction_type.as_str())
        .bind(&entry.description)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_history", e))?;

        Ok(HistoryEntry {
            id: RecordId::new(result.last_insert_rowid()),
            timestamp,
            transaction_type: entry.transaction_type,
            description: entry.description,
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let SqliteTx { tx, _writer } = *self;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }
}

fn parse_money(row: &SqliteRow, column: &str) -> Result<Money, StoreError> {
    let raw: String = row
        .try_get(column)
        .map_err(|e| map_sqlx_error(column, e))?;
    Money::from_str(&raw).map_err(|e| StoreError::Corrupt(format!("{column}: {e}")))
}

fn snapshot_from_row(row: &SqliteRow) -> Result<BalanceSnapshot, StoreError> {
    Ok(BalanceSnapshot {
        id: RecordId::new(row.try_get("id").map_err(|e| map_sqlx_error("id", e))?),
        timestamp: row
            .try_get::<DateTime<Utc>, _>("timestamp")
            .map_err(|e| map_sqlx_error("timestamp", e))?,
        amount: parse_money(row, "amount")?,
    })
}

fn inventory_from_row(row: &SqliteRow) -> Result<InventoryItem, StoreError> {
    Ok(InventoryItem {
        id: RecordId::new(row.try_get("id").map_err(|e| map_sqlx_error("id", e))?),
        product_name: row
            .try_get("product_name")
            .map_err(|e| map_sqlx_error("product_name", e))?,
        unit_price: parse_money(row, "unit_price")?,
        quantity: row.try_get("quantity").map_err(|e| map_sqlx_error("quantity", e))?,
    })
}

fn history_from_row(row: &SqliteRow) -> Result<HistoryEntry, StoreError> {
    let kind: String = row
        .try_get("transaction_type")
        .map_err(|e| map_sqlx_error("transaction_type", e))?;
    Ok(HistoryEntry {
        id: RecordId::new(row.try_get("id").map_err(|e| map_sqlx_error("id", e))?),
        timestamp: row
            .try_get::<DateTime<Utc>, _>("timestamp")
            .map_err(|e| map_sqlx_error("timestamp", e))?,
        transaction_type: TransactionKind::from_str(&kind)
            .map_err(|e| StoreError::Corrupt(format!("transaction_type: {e}")))?,
        description: row.try_get("history").map_err(|e| map_sqlx_error("history", e))?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.is_unique_violation() || db_err.is_check_violation() {
                StoreError::Conflict(msg)
            } else {
                StoreError::Database(msg)
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("failed to decode {operation}: {err}"))
        }
        sqlx::Error::PoolClosed => StoreError::Database(format!("connection pool closed in {operation}")),
        _ => StoreError::Database(format!("sqlx error in {operation}: {err}")),
    }
}
