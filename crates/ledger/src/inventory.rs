//! Inventory rows.

use serde::{Deserialize, Serialize};

use shopledger_core::{Entity, Money, RecordId};

/// A stocked product, keyed by its unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: RecordId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl Entity for InventoryItem {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Desired state of an inventory row after a transaction.
///
/// Stores insert a new row when `product_name` is unknown and otherwise only
/// overwrite `quantity`; the unit price of an existing row is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryUpsert {
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i64,
}
