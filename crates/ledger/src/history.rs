//! Transaction history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, Entity, RecordId};

use crate::balance::BalanceOperation;

/// Kind of business transaction recorded in the audit history.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Purchase,
    Sale,
    #[serde(rename = "Balance - Debit")]
    BalanceDebit,
    #[serde(rename = "Balance - Credit")]
    BalanceCredit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "Purchase",
            TransactionKind::Sale => "Sale",
            TransactionKind::BalanceDebit => "Balance - Debit",
            TransactionKind::BalanceCredit => "Balance - Credit",
        }
    }
}

impl From<BalanceOperation> for TransactionKind {
    fn from(op: BalanceOperation) -> Self {
        match op {
            BalanceOperation::Debit => TransactionKind::BalanceDebit,
            BalanceOperation::Credit => TransactionKind::BalanceCredit,
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Purchase" => Ok(TransactionKind::Purchase),
            "Sale" => Ok(TransactionKind::Sale),
            "Balance - Debit" => Ok(TransactionKind::BalanceDebit),
            "Balance - Credit" => Ok(TransactionKind::BalanceCredit),
            other => Err(DomainError::validation(format!("unknown transaction type '{other}'"))),
        }
    }
}

/// Audit trail record; append-only, never read back for state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub transaction_type: TransactionKind,
    pub description: String,
}

impl Entity for HistoryEntry {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// History entry before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub transaction_type: TransactionKind,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_round_trip_through_display_and_serde() {
        for kind in [
            TransactionKind::Purchase,
            TransactionKind::Sale,
            TransactionKind::BalanceDebit,
            TransactionKind::BalanceCredit,
        ] {
            assert_eq!(kind.to_string().parse::<TransactionKind>().unwrap(), kind);
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
        }
    }

    #[test]
    fn balance_operations_map_to_prefixed_kinds() {
        assert_eq!(TransactionKind::from(BalanceOperation::Debit).as_str(), "Balance - Debit");
        assert_eq!(TransactionKind::from(BalanceOperation::Credit).as_str(), "Balance - Credit");
    }
}
