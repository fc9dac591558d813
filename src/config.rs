//! Observer configuration, loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::ledger::RetryPolicy;
use crate::marketplaces::Marketplace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub rpc_url: String,
    /// Directory holding `<dataset>.json` collection files.
    pub datasets_dir: PathBuf,
    pub datasets: Vec<String>,
    pub marketplaces: Vec<String>,
    pub log_level: String,
    pub max_transaction_age_secs: u64,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub transport_retry_ms: u64,
    pub idle_interval_ms: u64,
    pub rate_limit_ms: u64,
    pub account_retry_ms: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            datasets_dir: PathBuf::from("datasets"),
            datasets: Vec::new(),
            marketplaces: Marketplace::all()
                .into_iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            log_level: "info".to_string(),
            max_transaction_age_secs: 300,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            transport_retry_ms: 1_000,
            idle_interval_ms: 10_000,
            rate_limit_ms: 1_000,
            account_retry_ms: 250,
        }
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            transport_retry: Duration::from_millis(config.transport_retry_ms),
            idle_interval: Duration::from_millis(config.idle_interval_ms),
            rate_limit: Duration::from_millis(config.rate_limit_ms),
            account_retry: Duration::from_millis(config.account_retry_ms),
        }
    }
}

impl ObserverConfig {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, Error> {
        toml::from_str(raw).map_err(|e| Error::Config {
            reason: e.to_string(),
        })
    }

    /// Reject settings that would leave the observer unable to run.
    pub fn validate(&self) -> Result<(), Error> {
        if self.rpc_url.trim().is_empty() {
            return Err(Error::Config {
                reason: "rpc_url is empty".to_string(),
            });
        }
        if self.marketplaces.is_empty() {
            return Err(Error::Config {
                reason: "no marketplaces configured".to_string(),
            });
        }
        self.resolved_marketplaces()?;
        Ok(())
    }

    /// Configured marketplaces in order, without repeats.
    pub fn resolved_marketplaces(&self) -> Result<Vec<Marketplace>, Error> {
        let mut resolved = Vec::with_capacity(self.marketplaces.len());
        for name in &self.marketplaces {
            let marketplace = Marketplace::from_name(name)?;
            if !resolved.contains(&marketplace) {
                resolved.push(marketplace);
            }
        }
        Ok(resolved)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.into()
    }

    pub fn max_transaction_age(&self) -> Duration {
        Duration::from_secs(self.max_transaction_age_secs)
    }
}
