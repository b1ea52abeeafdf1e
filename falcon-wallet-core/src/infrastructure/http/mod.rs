//! HTTP backend adapter
//!
//! Implements the backend service traits against the Falcon REST gateway.
//! `OfflineBackend` stands in when no gateway is configured.

use crate::domain::entities::{RemotePrice, TokenDescriptor, TokenMetadata, TransactionRecord, UserProfile};
use crate::domain::repositories::{PreferencesService, PriceSource, ProfileService, TransactionBackend};
use crate::shared::error::WalletError;
use crate::shared::types::{SourceSystem, TokenKey, TxDirection};
use async_trait::async_trait;
use num_bigint::BigUint;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Custom token row as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTokenWire {
    pub canister_id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub fee: u64,
}

impl From<CustomTokenWire> for TokenDescriptor {
    fn from(wire: CustomTokenWire) -> Self {
        TokenDescriptor::user_added(
            wire.canister_id,
            TokenMetadata {
                name: wire.name,
                symbol: wire.symbol,
                decimals: wire.decimals,
                fee: wire.fee,
            },
        )
    }
}

impl From<&TokenDescriptor> for CustomTokenWire {
    fn from(token: &TokenDescriptor) -> Self {
        Self {
            canister_id: token.ledger_id.clone(),
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            decimals: token.decimals,
            fee: token.transfer_fee,
        }
    }
}

/// Transaction row as served by the consolidated history endpoints
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendTransactionWire {
    pub id: String,
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub token_symbol: String,
    pub token_decimals: u8,
}

impl TryFrom<BackendTransactionWire> for TransactionRecord {
    type Error = WalletError;

    fn try_from(wire: BackendTransactionWire) -> Result<Self, Self::Error> {
        let direction: TxDirection = wire.kind.parse()?;
        let amount = wire
            .amount
            .parse::<BigUint>()
            .map_err(|e| WalletError::backend(format!("Invalid amount {}: {}", wire.amount, e)))?;
        Ok(TransactionRecord {
            id: wire.id,
            timestamp: wire.timestamp,
            direction,
            counterparty_from: wire.from,
            counterparty_to: wire.to,
            amount,
            token_symbol: wire.token_symbol,
            token_decimals: wire.token_decimals,
            source_system: SourceSystem::Backend,
        })
    }
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WalletError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check(response: Response) -> Result<Response, WalletError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(WalletError::backend(format!("Backend returned {}", status)))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, WalletError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| WalletError::backend(format!("GET {} failed: {}", path, e)))?;
        Self::check(response)?
            .json()
            .await
            .map_err(|e| WalletError::backend(format!("Invalid response from {}: {}", path, e)))
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<Response, WalletError> {
        let response = self
            .client
            .request(method.clone(), self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| WalletError::backend(format!("{} {} failed: {}", method, path, e)))?;
        Self::check(response)
    }

    fn records(rows: Vec<BackendTransactionWire>) -> Vec<TransactionRecord> {
        rows.into_iter()
            .filter_map(|row| match TransactionRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping malformed backend transaction: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl ProfileService for HttpBackend {
    async fn login(&self, address: &str) -> Result<UserProfile, WalletError> {
        let response = self
            .send_json(reqwest::Method::POST, "/api/login", &json!({ "address": address }))
            .await?;
        response
            .json()
            .await
            .map_err(|e| WalletError::backend(format!("Invalid login response: {}", e)))
    }
}

#[async_trait]
impl PreferencesService for HttpBackend {
    async fn custom_tokens(&self, address: &str) -> Result<Vec<TokenDescriptor>, WalletError> {
        let rows: Vec<CustomTokenWire> = self.get(&format!("/api/users/{}/tokens", address)).await?;
        Ok(rows.into_iter().map(TokenDescriptor::from).collect())
    }

    async fn add_custom_token(&self, address: &str, token: &TokenDescriptor) -> Result<(), WalletError> {
        let body = CustomTokenWire::from(token);
        self.send_json(reqwest::Method::POST, &format!("/api/users/{}/tokens", address), &body)
            .await?;
        Ok(())
    }

    async fn remove_custom_token(&self, address: &str, ledger_id: &str) -> Result<(), WalletError> {
        let path = format!("/api/users/{}/tokens/{}", address, ledger_id);
        let response = self
            .client
            .delete(self.url(&path))
            .send()
            .await
            .map_err(|e| WalletError::backend(format!("DELETE {} failed: {}", path, e)))?;
        Self::check(response)?;
        Ok(())
    }

    async fn hidden_tokens(&self, address: &str) -> Result<Vec<TokenKey>, WalletError> {
        self.get(&format!("/api/users/{}/hidden-tokens", address)).await
    }

    async fn save_hidden_tokens(&self, address: &str, token_ids: &[TokenKey]) -> Result<(), WalletError> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/api/users/{}/hidden-tokens", address),
            token_ids,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PriceSource for HttpBackend {
    async fn token_prices(&self) -> Result<Vec<RemotePrice>, WalletError> {
        self.get("/api/prices").await
    }
}

#[async_trait]
impl TransactionBackend for HttpBackend {
    async fn recent_transactions(&self, address: &str, limit: usize) -> Result<Vec<TransactionRecord>, WalletError> {
        let rows = self
            .get(&format!("/api/users/{}/transactions/recent?limit={}", address, limit))
            .await?;
        Ok(Self::records(rows))
    }

    async fn all_transactions(&self, address: &str) -> Result<Vec<TransactionRecord>, WalletError> {
        let rows = self.get(&format!("/api/users/{}/transactions", address)).await?;
        Ok(Self::records(rows))
    }
}

/// Used when no backend is deployed. Login answers with an offline profile;
/// everything else reports the backend as unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineBackend;

pub const OFFLINE_STATUS: &str = "offline";

fn offline() -> WalletError {
    WalletError::backend("No backend configured")
}

#[async_trait]
impl ProfileService for OfflineBackend {
    async fn login(&self, _address: &str) -> Result<UserProfile, WalletError> {
        Ok(UserProfile {
            plan: None,
            status: OFFLINE_STATUS.to_string(),
        })
    }
}

#[async_trait]
impl PreferencesService for OfflineBackend {
    async fn custom_tokens(&self, _address: &str) -> Result<Vec<TokenDescriptor>, WalletError> {
        Err(offline())
    }

    async fn add_custom_token(&self, _address: &str, _token: &TokenDescriptor) -> Result<(), WalletError> {
        Err(offline())
    }

    async fn remove_custom_token(&self, _address: &str, _ledger_id: &str) -> Result<(), WalletError> {
        Err(offline())
    }

    async fn hidden_tokens(&self, _address: &str) -> Result<Vec<TokenKey>, WalletError> {
        Err(offline())
    }

    async fn save_hidden_tokens(&self, _address: &str, _token_ids: &[TokenKey]) -> Result<(), WalletError> {
        Err(offline())
    }
}

#[async_trait]
impl PriceSource for OfflineBackend {
    async fn token_prices(&self) -> Result<Vec<RemotePrice>, WalletError> {
        Err(offline())
    }
}

#[async_trait]
impl TransactionBackend for OfflineBackend {
    async fn recent_transactions(&self, _address: &str, _limit: usize) -> Result<Vec<TransactionRecord>, WalletError> {
        Err(offline())
    }

    async fn all_transactions(&self, _address: &str) -> Result<Vec<TransactionRecord>, WalletError> {
        Err(offline())
    }
}
