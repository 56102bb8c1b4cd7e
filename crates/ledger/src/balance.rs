//! Balance snapshots and the manual adjustment operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, DomainResult, Entity, Money, RecordId};

/// One immutable recorded value of the running balance.
///
/// The current balance is the `amount` of the snapshot with the highest id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub amount: Money,
}

impl Entity for BalanceSnapshot {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Direction of a manual balance adjustment.
///
/// `Debit` adds to the balance and `Credit` subtracts from it. This is the
/// reverse of bookkeeping convention and is kept as the shop's forms label it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceOperation {
    Debit,
    Credit,
}

impl BalanceOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceOperation::Debit => "Debit",
            BalanceOperation::Credit => "Credit",
        }
    }

    /// Balance after adjusting `balance` by `amount` in this direction.
    pub fn apply(self, balance: Money, amount: Money) -> DomainResult<Money> {
        match self {
            BalanceOperation::Debit => balance.checked_add(amount),
            BalanceOperation::Credit => balance.checked_sub(amount),
        }
    }
}

impl core::fmt::Display for BalanceOperation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for BalanceOperation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debit" => Ok(BalanceOperation::Debit),
            "Credit" => Ok(BalanceOperation::Credit),
            other => Err(DomainError::validation(format!(
                "operation must be one of: Debit, Credit (got '{other}')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn debit_adds_and_credit_subtracts() {
        let balance = Money::new(dec!(950.00));
        let amount = Money::new(dec!(100.00));

        assert_eq!(
            BalanceOperation::Debit.apply(balance, amount).unwrap(),
            Money::new(dec!(1050.00))
        );
        assert_eq!(
            BalanceOperation::Credit.apply(balance, amount).unwrap(),
            Money::new(dec!(850.00))
        );
    }

    #[test]
    fn parses_only_exact_labels() {
        assert_eq!("Debit".parse::<BalanceOperation>().unwrap(), BalanceOperation::Debit);
        assert_eq!("Credit".parse::<BalanceOperation>().unwrap(), BalanceOperation::Credit);
        assert!("debit".parse::<BalanceOperation>().is_err());
        assert!("+".parse::<BalanceOperation>().is_err());
    }
}
