//! Transaction history and transfers
//!
//! This module contains the history aggregator and the send flow.
//! History prefers the consolidated backend; when it is empty or unreachable
//! each token ledger is queried directly and the per-token results are merged
//! newest first.

pub mod transfer;

pub use transfer::TransferService;

use crate::domain::entities::{newest_first, TokenDescriptor, TransactionPage, TransactionRecord};
use crate::domain::repositories::{LedgerClient, TransactionBackend};
use crate::shared::config::WalletCoreConfig;
use crate::shared::types::{TokenKey, TxDirection};
use crate::shared::utils::with_timeout;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySettings {
    pub timeout: Duration,
    /// Tokens queried directly when the backend has nothing
    pub recent_token_limit: usize,
    pub page_size: usize,
}

impl From<&WalletCoreConfig> for HistorySettings {
    fn from(config: &WalletCoreConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            recent_token_limit: config.recent_token_limit,
            page_size: config.history_page_size,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self::from(&WalletCoreConfig::default())
    }
}

/// Token and direction filters for the history view. `None` means all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub token_id: Option<TokenKey>,
    pub direction: Option<TxDirection>,
}

impl HistoryFilter {
    fn matches_token(&self, record: &TransactionRecord, catalog: &[TokenDescriptor]) -> bool {
        let Some(token_id) = &self.token_id else {
            return true;
        };
        match catalog.iter().find(|t| &t.id == token_id) {
            Some(token) => record.token_symbol.eq_ignore_ascii_case(&token.symbol),
            None => record.token_symbol.eq_ignore_ascii_case(token_id),
        }
    }

    fn matches_direction(&self, record: &TransactionRecord) -> bool {
        self.direction.map_or(true, |d| record.direction == d)
    }
}

pub struct TransactionAggregator {
    backend: Arc<dyn TransactionBackend>,
    ledger: Arc<dyn LedgerClient>,
    settings: HistorySettings,
}

impl TransactionAggregator {
    pub fn new(backend: Arc<dyn TransactionBackend>, ledger: Arc<dyn LedgerClient>, settings: HistorySettings) -> Self {
        Self {
            backend,
            ledger,
            settings,
        }
    }

    /// Latest transactions for the dashboard. Never fails; an empty list
    /// also stands for "history unavailable".
    pub async fn recent(&self, address: &str, catalog: &[TokenDescriptor], limit: usize) -> Vec<TransactionRecord> {
        match with_timeout(self.settings.timeout, self.backend.recent_transactions(address, limit)).await {
            Ok(records) if !records.is_empty() => return records,
            Ok(_) => log::debug!("Backend has no recent transactions for {}, querying ledgers", address),
            Err(e) => log::warn!("Backend history unavailable, querying ledgers: {}", e),
        }

        let tokens: Vec<&TokenDescriptor> = catalog.iter().take(self.settings.recent_token_limit).collect();
        let mut merged = self.merge_ledgers(address, &tokens, 0, limit as u64).await;
        merged.truncate(limit);
        merged
    }

    /// One page of history. Page 0 comes from the backend when it has
    /// anything; otherwise one ledger window of `page_size` per token.
    pub async fn history(
        &self,
        address: &str,
        catalog: &[TokenDescriptor],
        filter: &HistoryFilter,
        page: usize,
    ) -> TransactionPage {
        if page == 0 {
            match with_timeout(self.settings.timeout, self.backend.all_transactions(address)).await {
                Ok(records) if !records.is_empty() => {
                    let records = records
                        .into_iter()
                        .filter(|r| filter.matches_token(r, catalog) && filter.matches_direction(r))
                        .collect();
                    // The backend returns everything at once
                    return TransactionPage {
                        records,
                        has_more: false,
                    };
                }
                Ok(_) => log::debug!("Backend history empty for {}, querying ledgers", address),
                Err(e) => log::warn!("Backend history unavailable, querying ledgers: {}", e),
            }
        }

        let tokens: Vec<&TokenDescriptor> = match &filter.token_id {
            Some(id) => catalog.iter().filter(|t| &t.id == id).collect(),
            None => catalog.iter().collect(),
        };
        let page_size = self.settings.page_size;
        let start = (page * page_size) as u64;
        let merged = self.merge_ledgers(address, &tokens, start, page_size as u64).await;

        // Approximate: the ledgers expose no total count
        let has_more = merged.len() == page_size;
        let records = merged.into_iter().filter(|r| filter.matches_direction(r)).collect();
        TransactionPage { records, has_more }
    }

    async fn merge_ledgers(
        &self,
        address: &str,
        tokens: &[&TokenDescriptor],
        start: u64,
        length: u64,
    ) -> Vec<TransactionRecord> {
        let per_token = join_all(tokens.iter().map(|token| self.ledger_records(address, token, start, length))).await;
        let mut merged: Vec<TransactionRecord> = per_token.into_iter().flatten().collect();
        merged.sort_by(newest_first);
        merged
    }

    async fn ledger_records(
        &self,
        address: &str,
        token: &TokenDescriptor,
        start: u64,
        length: u64,
    ) -> Vec<TransactionRecord> {
        match with_timeout(self.settings.timeout, self.ledger.transactions(&token.ledger_id, start, length)).await {
            Ok(transactions) => transactions
                .iter()
                .filter_map(|tx| tx.to_record(address, token))
                .collect(),
            Err(e) => {
                log::warn!("Transaction log for {} unavailable: {}", token.symbol, e);
                Vec::new()
            }
        }
    }
}
