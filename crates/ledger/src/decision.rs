//! Pure decision logic: command + current state -> writes (or a rejection).
//!
//! Decisions never perform IO. The transaction engine reads the state inside
//! a store transaction, calls one of these functions, and performs exactly the
//! writes in the returned [`LedgerChange`].

use shopledger_core::Money;

use crate::command::{AdjustBalance, LedgerCommand, Purchase, Sale};
use crate::error::{LedgerError, Rejection};
use crate::history::{NewHistoryEntry, TransactionKind};
use crate::inventory::{InventoryItem, InventoryUpsert};

/// The writes of one accepted transaction.
///
/// Always exactly one history entry and one new balance snapshot; at most one
/// inventory row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerChange {
    pub inventory: Option<InventoryUpsert>,
    pub history: NewHistoryEntry,
    pub new_balance: Money,
}

/// Decide any ledger command.
///
/// `item` must be the current inventory row for `command.product_name()`, if
/// one exists; it is ignored for balance adjustments. The command's own
/// preconditions are checked again before anything is decided.
pub fn decide(
    command: &LedgerCommand,
    balance: Money,
    item: Option<&InventoryItem>,
) -> Result<LedgerChange, LedgerError> {
    command.validate()?;
    match command {
        LedgerCommand::Purchase(cmd) => decide_purchase(cmd, balance, item),
        LedgerCommand::Sale(cmd) => decide_sale(cmd, balance, item),
        LedgerCommand::AdjustBalance(cmd) => decide_adjustment(cmd, balance),
    }
}

pub fn decide_purchase(
    cmd: &Purchase,
    balance: Money,
    item: Option<&InventoryItem>,
) -> Result<LedgerChange, LedgerError> {
    let total = cmd.total()?;

    // Strictly less than: spending the exact balance is refused.
    if total >= balance {
        return Err(Rejection::InsufficientFunds {
            required: total,
            available: balance,
        }
        .into());
    }

    let upsert = match item {
        None => InventoryUpsert {
            product_name: cmd.product_name().to_string(),
            unit_price: cmd.unit_price(),
            quantity: cmd.quantity(),
        },
        Some(existing) => InventoryUpsert {
            product_name: existing.product_name.clone(),
            unit_price: existing.unit_price,
            quantity: existing
                .quantity
                .checked_add(cmd.quantity())
                .ok_or_else(|| shopledger_core::DomainError::validation("quantity out of range"))?,
        },
    };

    Ok(LedgerChange {
        inventory: Some(upsert),
        history: NewHistoryEntry {
            transaction_type: TransactionKind::Purchase,
            description: format!(
                "{} unit of {} added. Total price: {}",
                cmd.quantity(),
                cmd.product_name(),
                total
            ),
        },
        new_balance: balance.checked_sub(total)?,
    })
}

pub fn decide_sale(
    cmd: &Sale,
    balance: Money,
    item: Option<&InventoryItem>,
) -> Result<LedgerChange, LedgerError> {
    let existing = item.ok_or_else(|| Rejection::ProductNotFound(cmd.product_name().to_string()))?;
    if cmd.quantity() > existing.quantity {
        return Err(Rejection::InsufficientStock {
            available: existing.quantity,
        }
        .into());
    }
    let total = cmd.total()?;

    Ok(LedgerChange {
        inventory: Some(InventoryUpsert {
            product_name: existing.product_name.clone(),
            unit_price: existing.unit_price,
            quantity: existing.quantity - cmd.quantity(),
        }),
        history: NewHistoryEntry {
            transaction_type: TransactionKind::Sale,
            description: format!(
                "{} unit of {} sold. Total income: {}",
                cmd.quantity(),
                cmd.product_name(),
                total
            ),
        },
        new_balance: balance.checked_add(total)?,
    })
}

/// Balance adjustments have no floor; a `Credit` may take the balance negative.
pub fn decide_adjustment(cmd: &AdjustBalance, balance: Money) -> Result<LedgerChange, LedgerError> {
    let new_balance = cmd.operation().apply(balance, cmd.amount())?;

    Ok(LedgerChange {
        inventory: None,
        history: NewHistoryEntry {
            transaction_type: cmd.operation().into(),
            description: format!(
                "{} by {}. Current balance: {}",
                cmd.operation(),
                cmd.amount(),
                new_balance
            ),
        },
        new_balance,
    })
}
