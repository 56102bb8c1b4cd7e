//! Ledger domain module.
//!
//! Records (balance snapshots, inventory items, history entries), validated
//! commands, and the pure decision logic that turns a command plus the current
//! ledger state into the writes one transaction must perform. No IO lives here.

pub mod balance;
pub mod command;
pub mod decision;
pub mod error;
pub mod history;
pub mod inventory;

pub use balance::{BalanceOperation, BalanceSnapshot};
pub use command::{AdjustBalance, LedgerCommand, Purchase, Sale};
pub use decision::{decide, decide_adjustment, decide_purchase, decide_sale, LedgerChange};
pub use error::{LedgerError, Rejection};
pub use history::{HistoryEntry, NewHistoryEntry, TransactionKind};
pub use inventory::{InventoryItem, InventoryUpsert};
