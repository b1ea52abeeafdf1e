//! Runtime configuration for the wallet core
//!
//! This module resolves `WalletCoreConfig` from built-in defaults layered under
//! `FALCON_WALLET_*` environment variables. A `.env` file is loaded first when
//! present.

use crate::shared::constants::*;
use crate::shared::error::WalletError;
use crate::shared::types::Network;
use config::{Config, Environment};
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_PREFIX: &str = "FALCON_WALLET";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WalletCoreConfig {
    pub network: Network,
    /// REST gateway for profile, preferences, prices and history.
    /// `None` runs the core against the offline backend.
    pub backend_url: Option<String>,
    pub request_timeout_secs: u64,
    pub price_ttl_secs: u64,
    pub balance_poll_secs: u64,
    pub price_poll_secs: u64,
    pub transaction_poll_secs: u64,
    pub tron_poll_interval_ms: u64,
    pub tron_poll_attempts: u32,
    pub identity_session_days: u64,
    /// Upper bound on the identity login window before the attempt is abandoned
    pub identity_login_timeout_secs: u64,
    pub recent_token_limit: usize,
    pub history_page_size: usize,
    pub storage_namespace: String,
    pub stablecoin_keys: Vec<String>,
    pub log_level: String,
}

impl Default for WalletCoreConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            backend_url: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            price_ttl_secs: PRICE_TTL_SECS,
            balance_poll_secs: BALANCE_POLL_SECS,
            price_poll_secs: PRICE_POLL_SECS,
            transaction_poll_secs: TRANSACTION_POLL_SECS,
            tron_poll_interval_ms: TRON_POLL_INTERVAL_MS,
            tron_poll_attempts: TRON_POLL_MAX_ATTEMPTS,
            identity_session_days: IDENTITY_SESSION_DAYS,
            identity_login_timeout_secs: IDENTITY_LOGIN_TIMEOUT_SECS,
            recent_token_limit: RECENT_TOKEN_LIMIT,
            history_page_size: HISTORY_PAGE_SIZE,
            storage_namespace: STORAGE_NAMESPACE.to_string(),
            stablecoin_keys: DEFAULT_STABLECOIN_KEYS.iter().map(|k| k.to_string()).collect(),
            log_level: LOG_LEVEL.to_string(),
        }
    }
}

impl WalletCoreConfig {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> Result<Self, WalletError> {
        dotenv().ok();
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Resolve configuration from an explicit environment source
    pub fn from_environment(environment: Environment) -> Result<Self, WalletError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(
                environment
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("stablecoin_keys"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        log::debug!("Resolved wallet core configuration for {}", config.network.name());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.request_timeout_secs == 0 {
            return Err(WalletError::config("request_timeout_secs must be greater than zero"));
        }
        if self.balance_poll_secs == 0 || self.price_poll_secs == 0 || self.transaction_poll_secs == 0 {
            return Err(WalletError::config("Poll intervals must be greater than zero"));
        }
        if self.tron_poll_attempts == 0 || self.tron_poll_interval_ms == 0 {
            return Err(WalletError::config("Tron address polling must be bounded and non-empty"));
        }
        if self.identity_login_timeout_secs == 0 {
            return Err(WalletError::config("identity_login_timeout_secs must be greater than zero"));
        }
        if self.history_page_size == 0 {
            return Err(WalletError::config("history_page_size must be greater than zero"));
        }
        if self.storage_namespace.trim().is_empty() {
            return Err(WalletError::config("storage_namespace cannot be empty"));
        }
        if let Some(url) = &self.backend_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(WalletError::config(format!("backend_url must be an http(s) URL: {}", url)));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price_ttl_secs)
    }

    pub fn tron_poll_interval(&self) -> Duration {
        Duration::from_millis(self.tron_poll_interval_ms)
    }

    pub fn identity_session_ttl(&self) -> Duration {
        Duration::from_secs(self.identity_session_days * 24 * 60 * 60)
    }

    pub fn identity_login_timeout(&self) -> Duration {
        Duration::from_secs(self.identity_login_timeout_secs)
    }

    pub fn is_stablecoin(&self, token_key: &str) -> bool {
        self.stablecoin_keys.iter().any(|k| k.eq_ignore_ascii_case(token_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = WalletCoreConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.price_ttl(), Duration::from_secs(60));
        assert_eq!(config.tron_poll_attempts, 30);
        assert_eq!(config.identity_session_ttl(), Duration::from_secs(7 * 86_400));
        assert!(config.is_stablecoin("ckUSDT"));
        assert!(!config.is_stablecoin("icp"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        let config = WalletCoreConfig::from_environment(source(&[
            ("FALCON_WALLET_NETWORK", "ic"),
            ("FALCON_WALLET_BACKEND_URL", "https://api.falcon.example"),
            ("FALCON_WALLET_PRICE_TTL_SECS", "120"),
            ("FALCON_WALLET_STABLECOIN_KEYS", "ckusdt,ckusdc"),
        ]))
        .expect("Failed to load config");

        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.backend_url.as_deref(), Some("https://api.falcon.example"));
        assert_eq!(config.price_ttl_secs, 120);
        assert!(config.is_stablecoin("ckusdc"));
        assert_eq!(config.balance_poll_secs, BALANCE_POLL_SECS);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = WalletCoreConfig::from_environment(source(&[("FALCON_WALLET_TRON_POLL_ATTEMPTS", "0")]));
        assert!(matches!(result, Err(WalletError::Config(_))));

        let mut config = WalletCoreConfig::default();
        config.backend_url = Some("ftp://nope".to_string());
        assert!(config.validate().is_err());
    }
}
