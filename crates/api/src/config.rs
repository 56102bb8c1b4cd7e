//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use shopledger_core::Money;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid socket address: {value}")]
    InvalidAddr { key: &'static str, value: String },

    #[error("{key} is not a valid decimal amount: {value}")]
    InvalidAmount { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `DATABASE_URL`; `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// `OPENING_BALANCE`, seeded only when the ledger has no snapshot yet.
    pub opening_balance: Money,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr: SocketAddr = match get("BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidAddr {
                key: "BIND_ADDR",
                value,
            })?,
            None => DEFAULT_BIND_ADDR.parse().map_err(|_| ConfigError::InvalidAddr {
                key: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })?,
        };

        let opening_balance: Money = match get("OPENING_BALANCE") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidAmount {
                key: "OPENING_BALANCE",
                value,
            })?,
            None => Money::ZERO,
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            opening_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.opening_balance, Money::ZERO);
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let cfg = ApiConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", " sqlite://shop.db "),
            ("OPENING_BALANCE", "1000.00"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.database_url.as_deref(), Some("sqlite://shop.db"));
        assert_eq!(cfg.opening_balance, Money::new(Decimal::new(100000, 2)));
    }

    #[test]
    fn empty_database_url_means_in_memory() {
        let cfg = ApiConfig::from_lookup(lookup(&[("DATABASE_URL", "")])).unwrap();
        assert_eq!(cfg.database_url, None);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("BIND_ADDR", "not-an-addr")])),
            Err(ConfigError::InvalidAddr { .. })
        ));
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("OPENING_BALANCE", "lots")])),
            Err(ConfigError::InvalidAmount {
                key: "OPENING_BALANCE",
                value: "lots".to_string(),
            })
        );
    }
}
