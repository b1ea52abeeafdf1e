//! Price quote entities

use crate::shared::types::TokenKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub token_key: TokenKey,
    pub usd_price: f64,
    pub change_pct_24h: f64,
    pub fetched_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(token_key: impl Into<TokenKey>, usd_price: f64, change_pct_24h: f64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            token_key: token_key.into(),
            usd_price,
            change_pct_24h,
            fetched_at,
        }
    }

    /// Synthesized quote used when no price has ever been fetched.
    /// Stablecoins default to one dollar, everything else to zero.
    pub fn fallback(token_key: impl Into<TokenKey>, is_stablecoin: bool, at: DateTime<Utc>) -> Self {
        Self::new(token_key, if is_stablecoin { 1.0 } else { 0.0 }, 0.0, at)
    }
}

/// Whether data fetched at `fetched_at` is still within `ttl` of `now`
pub fn is_within_ttl(fetched_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    match (now - fetched_at).to_std() {
        Ok(age) => age < ttl,
        // fetched_at in the future counts as fresh
        Err(_) => true,
    }
}

/// Price row as reported by the remote price source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePrice {
    pub symbol: String,
    pub price_in_usd: f64,
    #[serde(default)]
    pub change_24h: f64,
}

impl RemotePrice {
    pub fn token_key(&self) -> TokenKey {
        self.symbol.to_ascii_lowercase()
    }
}
