//! USD price cache
//!
//! This module caches the price source's whole answer for a fixed TTL and
//! shares one in-flight fetch between concurrent callers. When a refresh
//! fails the last known quotes are served even if expired; when nothing was
//! ever fetched every requested key gets a synthesized quote (zero, or one
//! dollar for stablecoins) so USD math always has a number.

use crate::domain::entities::{is_within_ttl, PriceQuote, RemotePrice};
use crate::domain::repositories::PriceSource;
use crate::shared::config::WalletCoreConfig;
use crate::shared::error::WalletError;
use crate::shared::types::TokenKey;
use crate::shared::utils::with_timeout;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

type PriceFetch = Shared<BoxFuture<'static, Result<Arc<Vec<RemotePrice>>, WalletError>>>;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCacheSettings {
    pub ttl: Duration,
    pub timeout: Duration,
    pub stablecoin_keys: Vec<TokenKey>,
}

impl From<&WalletCoreConfig> for PriceCacheSettings {
    fn from(config: &WalletCoreConfig) -> Self {
        Self {
            ttl: config.price_ttl(),
            timeout: config.request_timeout(),
            stablecoin_keys: config.stablecoin_keys.iter().map(|k| k.to_ascii_lowercase()).collect(),
        }
    }
}

impl Default for PriceCacheSettings {
    fn default() -> Self {
        Self::from(&WalletCoreConfig::default())
    }
}

#[derive(Default)]
struct CacheState {
    quotes: HashMap<TokenKey, PriceQuote>,
    fetched_at: Option<DateTime<Utc>>,
    in_flight: Option<(u64, PriceFetch)>,
    generation: u64,
}

pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    settings: PriceCacheSettings,
    state: Mutex<CacheState>,
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>, settings: PriceCacheSettings) -> Self {
        Self {
            source,
            settings,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Quotes for `keys`. Never fails.
    pub async fn get_prices(&self, keys: &[TokenKey]) -> HashMap<TokenKey, PriceQuote> {
        let now = Utc::now();
        let (generation, fetch) = {
            let mut state = self.lock();
            if self.is_fresh(&state, now) {
                return self.select(&state.quotes, keys, now);
            }
            match &state.in_flight {
                Some((generation, fetch)) => (*generation, fetch.clone()),
                None => {
                    state.generation += 1;
                    let generation = state.generation;
                    let fetch = self.start_fetch();
                    state.in_flight = Some((generation, fetch.clone()));
                    (generation, fetch)
                }
            }
        };

        let outcome = fetch.await;

        let mut state = self.lock();
        // First caller back applies the shared result; the rest just read
        let applies = matches!(&state.in_flight, Some((current, _)) if *current == generation);
        if applies {
            state.in_flight = None;
        }

        match outcome {
            Ok(prices) => {
                let fetched_at = Utc::now();
                let quotes: HashMap<TokenKey, PriceQuote> = prices
                    .iter()
                    .map(|p| (p.token_key(), PriceQuote::new(p.token_key(), p.price_in_usd, p.change_24h, fetched_at)))
                    .collect();
                if applies {
                    log::debug!("Price cache refreshed with {} quote(s)", quotes.len());
                    state.quotes = quotes.clone();
                    state.fetched_at = Some(fetched_at);
                }
                self.select(&quotes, keys, fetched_at)
            }
            Err(e) => {
                if applies {
                    if state.fetched_at.is_some() {
                        log::warn!("Price refresh failed, serving last known quotes: {}", e);
                    } else {
                        log::warn!("Price refresh failed with no cached quotes, using fallbacks: {}", e);
                    }
                }
                self.select(&state.quotes, keys, Utc::now())
            }
        }
    }

    /// Drop every cached quote so the next call goes remote. A fetch already
    /// in flight still lands in the cache.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.quotes.clear();
        state.fetched_at = None;
        log::debug!("Price cache cleared");
    }

    pub fn is_stablecoin(&self, key: &str) -> bool {
        self.settings
            .stablecoin_keys
            .iter()
            .any(|k| k.eq_ignore_ascii_case(key))
    }

    fn start_fetch(&self) -> PriceFetch {
        let source = self.source.clone();
        let timeout = self.settings.timeout;
        async move {
            let prices = with_timeout(timeout, source.token_prices()).await?;
            Ok(Arc::new(prices))
        }
        .boxed()
        .shared()
    }

    fn is_fresh(&self, state: &CacheState, now: DateTime<Utc>) -> bool {
        state
            .fetched_at
            .map_or(false, |at| is_within_ttl(at, now, self.settings.ttl))
    }

    fn select(
        &self,
        quotes: &HashMap<TokenKey, PriceQuote>,
        keys: &[TokenKey],
        now: DateTime<Utc>,
    ) -> HashMap<TokenKey, PriceQuote> {
        keys.iter()
            .map(|key| {
                let key = key.to_ascii_lowercase();
                let quote = quotes
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| PriceQuote::fallback(key.clone(), self.is_stablecoin(&key), now));
                (key, quote)
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A panic while holding the lock leaves plain data behind
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
