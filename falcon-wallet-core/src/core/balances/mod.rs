//! Balance aggregation
//!
//! One balance query per token, all issued concurrently. A failing ledger
//! only zeroes its own entry.

use crate::domain::entities::{BalanceEntry, PriceQuote, TokenDescriptor};
use crate::domain::repositories::LedgerClient;
use crate::shared::error::WalletError;
use crate::shared::types::TokenKey;
use crate::shared::utils::{usd_value, with_timeout};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct BalanceAggregator {
    ledger: Arc<dyn LedgerClient>,
    timeout: Duration,
}

impl BalanceAggregator {
    pub fn new(ledger: Arc<dyn LedgerClient>, timeout: Duration) -> Self {
        Self { ledger, timeout }
    }

    pub async fn fetch_one(&self, address: &str, token: &TokenDescriptor) -> Result<BalanceEntry, WalletError> {
        let raw = with_timeout(self.timeout, self.ledger.balance_of(&token.ledger_id, address)).await?;
        Ok(BalanceEntry::new(token.clone(), raw))
    }

    /// Balances for every token in `catalog`, in catalog order. Never fails.
    pub async fn fetch_all(&self, address: &str, catalog: &[TokenDescriptor]) -> Vec<BalanceEntry> {
        let queries = catalog.iter().map(|token| async move {
            match self.fetch_one(address, token).await {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Balance query for {} failed, showing zero: {}", token.symbol, e);
                    BalanceEntry::zero(token.clone())
                }
            }
        });
        join_all(queries).await
    }
}

/// Total USD value of `balances`; tokens without a quote count as zero.
pub fn portfolio_value(balances: &[BalanceEntry], prices: &HashMap<TokenKey, PriceQuote>) -> f64 {
    balances
        .iter()
        .map(|entry| {
            let price = prices
                .get(&entry.token.price_key())
                .map(|quote| quote.usd_price)
                .unwrap_or(0.0);
            usd_value(&entry.raw_balance, entry.token.decimals, price)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tokens::builtin_tokens;
    use crate::domain::repositories::MockLedgerClient;
    use crate::shared::constants::{CKBTC_TOKEN, ICP_TOKEN};
    use chrono::Utc;
    use num_bigint::BigUint;
    use num_traits::Zero;

    const ADDRESS: &str = "abc-principal";

    #[tokio::test]
    async fn test_icp_balance_is_formatted() {
        let mut ledger = MockLedgerClient::new();
        ledger
            .expect_balance_of()
            .withf(|ledger_id, owner| ledger_id == ICP_TOKEN.ledger_id && owner == ADDRESS)
            .times(1)
            .returning(|_, _| Ok(BigUint::from(150_000_000u64)));
        let aggregator = BalanceAggregator::new(Arc::new(ledger), Duration::from_secs(1));

        let entries = aggregator
            .fetch_all(ADDRESS, &[TokenDescriptor::from(&ICP_TOKEN)])
            .await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].formatted_balance, "1.50");
    }

    #[tokio::test]
    async fn test_single_failure_zeroes_only_that_token() {
        let mut ledger = MockLedgerClient::new();
        ledger.expect_balance_of().times(4).returning(|ledger_id, _| {
            if ledger_id == CKBTC_TOKEN.ledger_id {
                Err(WalletError::ledger("canister trapped"))
            } else {
                Ok(BigUint::from(1_000_000u64))
            }
        });
        let aggregator = BalanceAggregator::new(Arc::new(ledger), Duration::from_secs(1));
        let catalog = builtin_tokens();

        let entries = aggregator.fetch_all(ADDRESS, &catalog).await;
        assert_eq!(entries.len(), catalog.len());
        for (entry, token) in entries.iter().zip(catalog.iter()) {
            assert_eq!(&entry.token, token);
            if token.ledger_id == CKBTC_TOKEN.ledger_id {
                assert!(entry.raw_balance.is_zero());
            } else {
                assert_eq!(entry.raw_balance, BigUint::from(1_000_000u64));
            }
        }
    }

    #[tokio::test]
    async fn test_hung_ledger_times_out_to_zero() {
        struct HungLedger;

        #[async_trait::async_trait]
        impl LedgerClient for HungLedger {
            async fn balance_of(&self, _: &str, _: &str) -> Result<BigUint, WalletError> {
                std::future::pending().await
            }
            async fn metadata(&self, _: &str) -> Result<Vec<(String, crate::domain::entities::MetadataValue)>, WalletError> {
                std::future::pending().await
            }
            async fn transfer(&self, _: &str, _: &str, _: &BigUint) -> Result<u64, WalletError> {
                std::future::pending().await
            }
            async fn transactions(
                &self,
                _: &str,
                _: u64,
                _: u64,
            ) -> Result<Vec<crate::domain::entities::LedgerTransaction>, WalletError> {
                std::future::pending().await
            }
        }

        let aggregator = BalanceAggregator::new(Arc::new(HungLedger), Duration::from_millis(10));
        let entries = aggregator.fetch_all(ADDRESS, &[TokenDescriptor::from(&ICP_TOKEN)]).await;
        assert!(entries[0].raw_balance.is_zero());

        let direct = aggregator.fetch_one(ADDRESS, &TokenDescriptor::from(&ICP_TOKEN)).await;
        assert!(matches!(direct, Err(WalletError::Timeout(_))));
    }

    #[test]
    fn test_portfolio_value() {
        let now = Utc::now();
        let balances = vec![
            BalanceEntry::new(TokenDescriptor::from(&ICP_TOKEN), BigUint::from(250_000_000u64)),
            BalanceEntry::new(TokenDescriptor::from(&CKBTC_TOKEN), BigUint::from(1_000_000u64)),
        ];
        let mut prices = HashMap::new();
        prices.insert("icp".to_string(), PriceQuote::new("icp", 10.0, 0.0, now));

        let total = portfolio_value(&balances, &prices);
        assert!((total - 25.0).abs() < 1e-9);
    }
}
