//! Business-rule rejections.

use thiserror::Error;

use shopledger_core::{DomainError, Money};

/// A business rule turned the request down; the ledger is left unchanged.
///
/// Messages are shown to the shop user as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Insufficient balance for purchase of {required}. Current balance: {available}")]
    InsufficientFunds { required: Money, available: Money },

    #[error("Product {0} not in inventory.")]
    ProductNotFound(String),

    #[error("Insufficient product quantity. Current quantity is {available}.")]
    InsufficientStock { available: i64 },
}

/// Failure of a ledger decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
