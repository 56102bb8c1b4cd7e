//! Read-only views over the ledger.
//!
//! Queries never open a write transaction, so they do not wait on an
//! in-flight purchase, sale or adjustment; they see the last committed state.

use tracing::instrument;

use shopledger_core::Money;
use shopledger_ledger::{HistoryEntry, InventoryItem};

use crate::store::{LedgerStore, StoreError};

#[derive(Debug, Clone)]
pub struct LedgerQuery<S> {
    store: S,
}

impl<S> LedgerQuery<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Amount of the latest balance snapshot.
    pub async fn current_balance(&self) -> Result<Money, StoreError> {
        self.store.latest_balance().await
    }

    /// Every inventory row in insertion order, including zero-quantity rows.
    #[instrument(skip(self), err)]
    pub async fn list_inventory(&self) -> Result<Vec<InventoryItem>, StoreError> {
        self.store.all_inventory_items().await
    }

    /// Every history entry in insertion order.
    #[instrument(skip(self), err)]
    pub async fn list_history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        self.store.all_history_entries().await
    }

    pub async fn find_item(&self, product_name: &str) -> Result<Option<InventoryItem>, StoreError> {
        self.store.find_inventory_item(product_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLedgerStore;
    use crate::transaction_engine::TransactionEngine;
    use rust_decimal_macros::dec;
    use shopledger_ledger::{Purchase, Sale};
    use std::sync::Arc;

    #[tokio::test]
    async fn empty_ledger_has_no_balance_but_lists_nothing() {
        let query = LedgerQuery::new(InMemoryLedgerStore::new());
        assert!(matches!(query.current_balance().await, Err(StoreError::EmptyLedger)));
        assert!(query.list_inventory().await.unwrap().is_empty());
        assert!(query.list_history().await.unwrap().is_empty());
        assert!(query.find_item("Widget").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sold_out_items_stay_listed() {
        let store = Arc::new(InMemoryLedgerStore::new());
        store.seed_opening_balance(Money::new(dec!(100))).await.unwrap();
        let engine = TransactionEngine::new(store.clone());
        let query = LedgerQuery::new(store);

        engine
            .purchase(Purchase::new("Widget", Money::new(dec!(2)), 3).unwrap())
            .await
            .unwrap();
        engine
            .purchase(Purchase::new("Gadget", Money::new(dec!(1)), 1).unwrap())
            .await
            .unwrap();
        engine
            .sale(Sale::new("Widget", Money::new(dec!(4)), 3).unwrap())
            .await
            .unwrap();

        let names: Vec<_> = query
            .list_inventory()
            .await
            .unwrap()
            .into_iter()
            .map(|i| (i.product_name, i.quantity))
            .collect();
        assert_eq!(names, vec![("Widget".to_string(), 0), ("Gadget".to_string(), 1)]);
        assert_eq!(query.current_balance().await.unwrap(), Money::new(dec!(105)));

        let history = query.list_history().await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(history[2].description, "3 unit of Widget sold. Total income: 12");
    }
}
