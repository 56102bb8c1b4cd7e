use std::sync::Arc;

use anyhow::Context;

use shopledger_core::Money;
use shopledger_infra::{InMemoryLedgerStore, LedgerQuery, LedgerStore, SqliteLedgerStore, TransactionEngine};

use crate::config::ApiConfig;

/// Shared store handle; both backends sit behind the same trait object.
pub type SharedStore = Arc<dyn LedgerStore>;

/// Services shared by every handler (wrapped in `Arc` and passed as an `Extension`).
pub struct AppServices {
    engine: TransactionEngine<SharedStore>,
    query: LedgerQuery<SharedStore>,
}

impl AppServices {
    pub fn new(store: SharedStore) -> Self {
        Self {
            engine: TransactionEngine::new(store.clone()),
            query: LedgerQuery::new(store),
        }
    }

    /// In-memory ledger seeded with `opening_balance` (dev/test wiring).
    pub async fn in_memory(opening_balance: Money) -> anyhow::Result<Self> {
        let store: SharedStore = Arc::new(InMemoryLedgerStore::new());
        seed(&store, opening_balance).await?;
        Ok(Self::new(store))
    }

    /// Open the store selected by `config` and seed the opening balance if the
    /// ledger is empty.
    pub async fn open(config: &ApiConfig) -> anyhow::Result<Self> {
        let store: SharedStore = match config.database_url.as_deref() {
            Some(url) => {
                let sqlite = SqliteLedgerStore::connect(url)
                    .await
                    .with_context(|| format!("failed to open ledger database {url}"))?;
                tracing::info!(backend = "sqlite", "ledger store ready");
                Arc::new(sqlite)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory ledger (data is lost on exit)");
                Arc::new(InMemoryLedgerStore::new())
            }
        };

        seed(&store, config.opening_balance).await?;
        Ok(Self::new(store))
    }

    pub fn engine(&self) -> &TransactionEngine<SharedStore> {
        &self.engine
    }

    pub fn query(&self) -> &LedgerQuery<SharedStore> {
        &self.query
    }
}

async fn seed(store: &SharedStore, opening_balance: Money) -> anyhow::Result<()> {
    let seeded = store
        .seed_opening_balance(opening_balance)
        .await
        .context("failed to seed opening balance")?;
    if seeded {
        tracing::info!(balance = %opening_balance, "seeded opening balance");
    }
    Ok(())
}
