//! Infrastructure layer: ledger storage, the transaction engine and read queries.

pub mod query;
pub mod store;
pub mod transaction_engine;

pub use query::LedgerQuery;
pub use store::{InMemoryLedgerStore, LedgerStore, LedgerTx, SqliteLedgerStore, StoreError};
pub use transaction_engine::{Applied, TransactionEngine, TransactionError};
