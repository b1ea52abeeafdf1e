//! Backend service access
//!
//! Profile, preferences, prices and consolidated history served by the
//! application backend. Every caller treats these as best-effort.

use crate::domain::entities::{RemotePrice, TokenDescriptor, TransactionRecord, UserProfile};
use crate::shared::error::WalletError;
use crate::shared::types::TokenKey;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn login(&self, address: &str) -> Result<UserProfile, WalletError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferencesService: Send + Sync {
    async fn custom_tokens(&self, address: &str) -> Result<Vec<TokenDescriptor>, WalletError>;

    async fn add_custom_token(&self, address: &str, token: &TokenDescriptor) -> Result<(), WalletError>;

    async fn remove_custom_token(&self, address: &str, ledger_id: &str) -> Result<(), WalletError>;

    async fn hidden_tokens(&self, address: &str) -> Result<Vec<TokenKey>, WalletError>;

    async fn save_hidden_tokens(&self, address: &str, token_ids: &[TokenKey]) -> Result<(), WalletError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn token_prices(&self) -> Result<Vec<RemotePrice>, WalletError>;
}

/// Consolidated, already merged history kept by the backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionBackend: Send + Sync {
    async fn recent_transactions(&self, address: &str, limit: usize) -> Result<Vec<TransactionRecord>, WalletError>;

    async fn all_transactions(&self, address: &str) -> Result<Vec<TransactionRecord>, WalletError>;
}
