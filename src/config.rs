//! Ledger configuration.
//!
//! Loaded from a TOML file, optionally overridden from the environment:
//!
//! ```toml
//! settlement = "subscriber"
//! close = "either"
//!
//! [[genesis]]
//! principal = "wallet_2"
//! balance = 1000000
//! ```

use crate::amount::Amount;
use crate::error::{EngineError, Result};
use crate::types::Principal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding [`LedgerConfig::settlement`].
pub const ENV_SETTLEMENT: &str = "DATA_LOOP_SETTLEMENT";

/// Environment variable overriding [`LedgerConfig::close`].
pub const ENV_CLOSE: &str = "DATA_LOOP_CLOSE";

/// Who may trigger settlement of a payment stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlePolicy {
    /// Only the paying subscriber.
    #[default]
    Subscriber,
    /// Any principal; funds still move from the subscriber.
    Anyone,
}

impl FromStr for SettlePolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "subscriber" => Ok(SettlePolicy::Subscriber),
            "anyone" => Ok(SettlePolicy::Anyone),
            other => Err(EngineError::Config(format!(
                "unknown settlement policy '{}'",
                other
            ))),
        }
    }
}

/// Who may close a payment stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosePolicy {
    #[default]
    Subscriber,
    Provider,
    Either,
}

impl FromStr for ClosePolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "subscriber" => Ok(ClosePolicy::Subscriber),
            "provider" => Ok(ClosePolicy::Provider),
            "either" => Ok(ClosePolicy::Either),
            other => Err(EngineError::Config(format!(
                "unknown close policy '{}'",
                other
            ))),
        }
    }
}

/// Balance credited to a principal when the ledger is created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenesisAccount {
    pub principal: Principal,
    pub balance: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub settlement: SettlePolicy,
    pub close: ClosePolicy,
    pub genesis: Vec<GenesisAccount>,
}

impl LedgerConfig {
    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = LedgerConfig::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overrides policies from `DATA_LOOP_SETTLEMENT` / `DATA_LOOP_CLOSE` when set.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(ENV_SETTLEMENT) {
            self.settlement = value.parse()?;
        }
        if let Ok(value) = std::env::var(ENV_CLOSE) {
            self.close = value.parse()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_subscriber_only() {
        let config = LedgerConfig::default();
        assert_eq!(config.settlement, SettlePolicy::Subscriber);
        assert_eq!(config.close, ClosePolicy::Subscriber);
        assert!(config.genesis.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = LedgerConfig::from_toml(
            r#"
settlement = "anyone"
close = "either"

[[genesis]]
principal = "wallet_2"
balance = 1000

[[genesis]]
principal = "wallet_3"
balance = "340282366920938463463374607431768211455"
"#,
        )
        .unwrap();

        assert_eq!(config.settlement, SettlePolicy::Anyone);
        assert_eq!(config.close, ClosePolicy::Either);
        assert_eq!(config.genesis.len(), 2);
        assert_eq!(config.genesis[0].principal, Principal::from("wallet_2"));
        assert_eq!(config.genesis[0].balance, Amount::new(1000));
        assert_eq!(config.genesis[1].balance, Amount::MAX);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = LedgerConfig::from_toml(r#"close = "provider""#).unwrap();
        assert_eq!(config.close, ClosePolicy::Provider);
        assert_eq!(config.settlement, SettlePolicy::Subscriber);
    }

    #[test]
    fn test_rejects_unknown_policy_and_fields() {
        assert!(LedgerConfig::from_toml(r#"close = "nobody""#).is_err());
        assert!(LedgerConfig::from_toml(r#"retries = 3"#).is_err());
        assert!(LedgerConfig::from_toml("[[genesis]]\nprincipal = \"a\"\nbalance = -5").is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Anyone".parse::<SettlePolicy>().unwrap(), SettlePolicy::Anyone);
        assert_eq!(" either ".parse::<ClosePolicy>().unwrap(), ClosePolicy::Either);
        assert!("sometimes".parse::<SettlePolicy>().is_err());
    }
}
