use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use shopledger_core::{Entity, Money, RecordId};
use shopledger_ledger::{BalanceSnapshot, HistoryEntry, InventoryItem, InventoryUpsert, NewHistoryEntry};

use super::{LedgerStore, LedgerTx, StoreError};

#[derive(Debug, Default)]
struct Tables {
    balances: Vec<BalanceSnapshot>,
    inventory: Vec<InventoryItem>,
    history: Vec<HistoryEntry>,
}

/// Id following the last row of `rows`, or 1 for an empty table.
fn next_id<E: Entity>(rows: &[E]) -> RecordId {
    rows.last().map(|row| row.id().next()).unwrap_or(RecordId::new(1))
}

/// In-memory ledger store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
    writer: Arc<Mutex<()>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))?;
        Ok(f(&tables))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn latest_balance(&self) -> Result<Money, StoreError> {
        self.read(|t| t.balances.last().map(|b| b.amount))?
            .ok_or(StoreError::EmptyLedger)
    }

    async fn find_inventory_item(&self, product_name: &str) -> Result<Option<InventoryItem>, StoreError> {
        self.read(|t| t.inventory.iter().find(|i| i.product_name == product_name).cloned())
    }

    async fn all_inventory_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        self.read(|t| t.inventory.clone())
    }

    async fn all_history_entries(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        self.read(|t| t.history.clone())
    }

    async fn all_balance_snapshots(&self) -> Result<Vec<BalanceSnapshot>, StoreError> {
        self.read(|t| t.balances.clone())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let guard = self.writer.clone().lock_owned().await;
        Ok(Box::new(InMemoryTx {
            tables: self.tables.clone(),
            pending: Tables::default(),
            _writer: guard,
        }))
    }
}

/// Transaction over the in-memory tables.
///
/// Writes are staged in `pending` and published under one write lock on
/// commit. Staged inventory rows shadow committed rows with the same name.
struct InMemoryTx {
    tables: Arc<RwLock<Tables>>,
    pending: Tables,
    _writer: OwnedMutexGuard<()>,
}

impl InMemoryTx {
    fn committed<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))?;
        Ok(f(&tables))
    }

    fn pending_item(&self, product_name: &str) -> Option<&InventoryItem> {
        self.pending.inventory.iter().find(|i| i.product_name == product_name)
    }
}

#[async_trait]
impl LedgerTx for InMemoryTx {
    async fn latest_balance(&mut self) -> Result<Money, StoreError> {
        if let Some(staged) = self.pending.balances.last() {
            return Ok(staged.amount);
        }
        self.committed(|t| t.balances.last().map(|b| b.amount))?
            .ok_or(StoreError::EmptyLedger)
    }

    async fn find_inventory_item(&mut self, product_name: &str) -> Result<Option<InventoryItem>, StoreError> {
        if let Some(staged) = self.pending_item(product_name) {
            return Ok(Some(staged.clone()));
        }
        self.committed(|t| t.inventory.iter().find(|i| i.product_name == product_name).cloned())
    }

    async fn append_snapshot(&mut self, amount: Money) -> Result<BalanceSnapshot, StoreError> {
        let id = match self.pending.balances.last() {
            Some(staged) => staged.id.next(),
            None => self.committed(|t| next_id(&t.balances))?,
        };
        let snapshot = BalanceSnapshot {
            id,
            timestamp: Utc::now(),
            amount,
        };
        self.pending.balances.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn upsert_inventory_item(&mut self, item: InventoryUpsert) -> Result<InventoryItem, StoreError> {
        if item.quantity < 0 {
            return Err(StoreError::Conflict(format!(
                "quantity of {} cannot go negative",
                item.product_name
            )));
        }

        let existing = self.find_inventory_item(&item.product_name).await?;
        let row = match existing {
            Some(mut row) => {
                row.quantity = item.quantity;
                row
            }
            None => {
                let staged_max = self.pending.inventory.iter().map(|i| i.id).max();
                let id = match staged_max {
                    Some(max) => max.next().max(self.committed(|t| next_id(&t.inventory))?),
                    None => self.committed(|t| next_id(&t.inventory))?,
                };
                InventoryItem {
                    id,
                    product_name: item.product_name,
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                }
            }
        };

        match self.pending.inventory.iter_mut().find(|i| i.id == row.id) {
            Some(staged) => *staged = row.clone(),
            None => self.pending.inventory.push(row.clone()),
        }
        Ok(row)
    }

    async fn append_history(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        let id = match self.pending.history.last() {
            Some(staged) => staged.id.next(),
            None => self.committed(|t| next_id(&t.history))?,
        };
        let entry = HistoryEntry {
            id,
            timestamp: Utc::now(),
            transaction_type: entry.transaction_type,
            description: entry.description,
        };
        self.pending.history.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTx {
            tables,
            pending,
            _writer,
        } = *self;

        let mut tables = tables
            .write()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))?;

        tables.balances.extend(pending.balances);
        tables.history.extend(pending.history);
        for row in pending.inventory {
            match tables.inventory.iter_mut().find(|i| i.id == row.id) {
                Some(existing) => existing.quantity = row.quantity,
                None => tables.inventory.push(row),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::run_transaction;
    use rust_decimal_macros::dec;
    use shopledger_ledger::TransactionKind;

    fn widget(quantity: i64) -> InventoryUpsert {
        InventoryUpsert {
            product_name: "Widget".to_string(),
            unit_price: Money::new(dec!(10.00)),
            quantity,
        }
    }

    fn purchase_entry() -> NewHistoryEntry {
        NewHistoryEntry {
            transaction_type: TransactionKind::Purchase,
            description: "5 unit of Widget added. Total price: 50.00".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_store_has_no_balance() {
        let store = InMemoryLedgerStore::new();
        assert!(matches!(store.latest_balance().await, Err(StoreError::EmptyLedger)));
    }

    #[tokio::test]
    async fn seeding_only_happens_once() {
        let store = InMemoryLedgerStore::new();
        assert!(store.seed_opening_balance(Money::new(dec!(1000.00))).await.unwrap());
        assert!(!store.seed_opening_balance(Money::new(dec!(5.00))).await.unwrap());

        assert_eq!(store.latest_balance().await.unwrap(), Money::new(dec!(1000.00)));
        assert_eq!(store.all_balance_snapshots().await.unwrap().len(), 1);
        assert!(store.all_history_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let store = InMemoryLedgerStore::new();
        store.seed_opening_balance(Money::new(dec!(1000.00))).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.upsert_inventory_item(widget(5)).await.unwrap();
        tx.append_history(purchase_entry()).await.unwrap();
        tx.append_snapshot(Money::new(dec!(950.00))).await.unwrap();

        // The transaction sees its own writes; plain reads do not.
        assert_eq!(tx.latest_balance().await.unwrap(), Money::new(dec!(950.00)));
        assert_eq!(tx.find_inventory_item("Widget").await.unwrap().unwrap().quantity, 5);
        assert_eq!(store.latest_balance().await.unwrap(), Money::new(dec!(1000.00)));
        assert!(store.find_inventory_item("Widget").await.unwrap().is_none());

        tx.commit().await.unwrap();

        assert_eq!(store.latest_balance().await.unwrap(), Money::new(dec!(950.00)));
        let items = store.all_inventory_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, RecordId::new(1));
        assert_eq!(store.all_history_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dropped_transaction_writes_nothing() {
        let store = InMemoryLedgerStore::new();
        store.seed_opening_balance(Money::new(dec!(1000.00))).await.unwrap();

        let result: Result<(), StoreError> = run_transaction(&store, |tx| {
            Box::pin(async move {
                tx.upsert_inventory_item(widget(5)).await?;
                tx.append_history(purchase_entry()).await?;
                Err(StoreError::Database("disk full".to_string()))
            })
        })
        .await;

        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(store.all_balance_snapshots().await.unwrap().len(), 1);
        assert!(store.all_inventory_items().await.unwrap().is_empty());
        assert!(store.all_history_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_keeps_unit_price_and_id_of_existing_row() {
        let store = InMemoryLedgerStore::new();

        let mut tx = store.begin().await.unwrap();
        let created = tx.upsert_inventory_item(widget(5)).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let updated = tx
            .upsert_inventory_item(InventoryUpsert {
                product_name: "Widget".to_string(),
                unit_price: Money::new(dec!(99.00)),
                quantity: 8,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.unit_price, Money::new(dec!(10.00)));
        let items = store.all_inventory_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 8);
    }

    #[tokio::test]
    async fn negative_quantity_is_refused() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.upsert_inventory_item(widget(-1)).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn ids_increase_across_transactions() {
        let store = InMemoryLedgerStore::new();
        for amount in [dec!(1), dec!(2), dec!(3)] {
            let mut tx = store.begin().await.unwrap();
            tx.append_snapshot(Money::new(amount)).await.unwrap();
            tx.commit().await.unwrap();
        }

        let ids: Vec<i64> = store
            .all_balance_snapshots()
            .await
            .unwrap()
            .iter()
            .map(|s| s.id.get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.latest_balance().await.unwrap(), Money::new(dec!(3)));
    }
}
