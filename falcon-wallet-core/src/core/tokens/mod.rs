//! Token catalog
//!
//! This module holds the combined token list for the active address: the
//! built-in tokens plus the tokens the user added, and the ids the user chose
//! to hide. Ledger ids are unique across the combined list. Local state is
//! authoritative for the session; the preferences service is written through
//! best-effort.

pub mod deposit;

pub use deposit::{DepositAddress, DepositService};

use crate::domain::entities::{TokenDescriptor, TokenMetadata};
use crate::domain::repositories::{LedgerClient, PreferencesService};
use crate::shared::constants::BUILTIN_TOKENS;
use crate::shared::error::WalletError;
use crate::shared::types::TokenKey;
use crate::shared::utils::with_timeout;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Built-in tokens in display order
pub fn builtin_tokens() -> Vec<TokenDescriptor> {
    BUILTIN_TOKENS.iter().map(|config| TokenDescriptor::from(*config)).collect()
}

/// Concatenate base and user tokens, rejecting a repeated ledger id.
pub fn build_catalog(base: &[TokenDescriptor], user: &[TokenDescriptor]) -> Result<Vec<TokenDescriptor>, WalletError> {
    let mut seen = HashSet::new();
    let mut catalog = Vec::with_capacity(base.len() + user.len());
    for token in base.iter().chain(user.iter()) {
        if !seen.insert(token.ledger_id.as_str()) {
            return Err(WalletError::conflict(format!(
                "Token with ledger {} is already in the catalog",
                token.ledger_id
            )));
        }
        catalog.push(token.clone());
    }
    Ok(catalog)
}

#[derive(Default)]
struct CatalogState {
    user: Vec<TokenDescriptor>,
    hidden: HashSet<TokenKey>,
}

impl CatalogState {
    fn contains_ledger(&self, base: &[TokenDescriptor], ledger_id: &str) -> bool {
        base.iter().chain(self.user.iter()).any(|t| t.ledger_id == ledger_id)
    }
}

pub struct TokenCatalog {
    ledger: Arc<dyn LedgerClient>,
    preferences: Arc<dyn PreferencesService>,
    timeout: Duration,
    base: Vec<TokenDescriptor>,
    state: RwLock<CatalogState>,
}

impl TokenCatalog {
    pub fn new(ledger: Arc<dyn LedgerClient>, preferences: Arc<dyn PreferencesService>, timeout: Duration) -> Self {
        Self::with_base(ledger, preferences, timeout, builtin_tokens())
    }

    pub fn with_base(
        ledger: Arc<dyn LedgerClient>,
        preferences: Arc<dyn PreferencesService>,
        timeout: Duration,
        base: Vec<TokenDescriptor>,
    ) -> Self {
        Self {
            ledger,
            preferences,
            timeout,
            base,
            state: RwLock::new(CatalogState::default()),
        }
    }

    /// Every token, hidden ones included
    pub async fn tokens(&self) -> Vec<TokenDescriptor> {
        let state = self.state.read().await;
        self.base.iter().chain(state.user.iter()).cloned().collect()
    }

    /// Tokens shown on the dashboard
    pub async fn visible(&self) -> Vec<TokenDescriptor> {
        let state = self.state.read().await;
        self.base
            .iter()
            .chain(state.user.iter())
            .filter(|t| !state.hidden.contains(&t.id))
            .cloned()
            .collect()
    }

    pub async fn hidden(&self) -> Vec<TokenKey> {
        let mut hidden: Vec<TokenKey> = self.state.read().await.hidden.iter().cloned().collect();
        hidden.sort();
        hidden
    }

    pub async fn find(&self, token_id: &str) -> Option<TokenDescriptor> {
        let state = self.state.read().await;
        self.base
            .iter()
            .chain(state.user.iter())
            .find(|t| t.id == token_id || t.ledger_id == token_id)
            .cloned()
    }

    /// Replace user tokens and hidden ids with what the preferences service
    /// holds for `address`. Either list degrades to empty when unavailable.
    pub async fn load(&self, address: &str) {
        let remote = match with_timeout(self.timeout, self.preferences.custom_tokens(address)).await {
            Ok(tokens) => tokens,
            Err(e) => {
                log::warn!("Custom tokens unavailable for {}: {}", address, e);
                Vec::new()
            }
        };
        let hidden = match with_timeout(self.timeout, self.preferences.hidden_tokens(address)).await {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("Hidden tokens unavailable for {}: {}", address, e);
                Vec::new()
            }
        };

        let mut user: Vec<TokenDescriptor> = Vec::with_capacity(remote.len());
        for mut token in remote {
            let duplicate = self.base.iter().chain(user.iter()).any(|t| t.ledger_id == token.ledger_id);
            if duplicate {
                log::warn!("Skipping duplicate custom token {}", token.ledger_id);
                continue;
            }
            token.is_user_added = true;
            user.push(token);
        }

        let mut state = self.state.write().await;
        log::info!("Loaded {} custom token(s) and {} hidden id(s) for {}", user.len(), hidden.len(), address);
        state.user = user;
        state.hidden = hidden.into_iter().collect();
    }

    /// Forget everything tied to the previous address
    pub async fn reset(&self) {
        *self.state.write().await = CatalogState::default();
    }

    /// Validate `ledger_id` against its live metadata and add it.
    ///
    /// A ledger already in the catalog is a `Conflict` and nothing changes.
    pub async fn add_token(&self, address: &str, ledger_id: &str) -> Result<TokenDescriptor, WalletError> {
        let ledger_id = ledger_id.trim();
        if ledger_id.is_empty() {
            return Err(WalletError::validation("Ledger id cannot be empty"));
        }
        self.ensure_absent(&*self.state.read().await, ledger_id)?;

        let entries = with_timeout(self.timeout, self.ledger.metadata(ledger_id)).await?;
        let metadata = TokenMetadata::from_entries(&entries)?;
        let token = TokenDescriptor::user_added(ledger_id, metadata);

        {
            // The catalog may have changed while metadata was in flight
            let mut state = self.state.write().await;
            self.ensure_absent(&state, ledger_id)?;
            state.user.push(token.clone());
        }
        log::info!("Added token {} ({})", token.symbol, token.ledger_id);

        if let Err(e) = with_timeout(self.timeout, self.preferences.add_custom_token(address, &token)).await {
            log::warn!("Failed to save custom token {} remotely: {}", token.ledger_id, e);
        }
        Ok(token)
    }

    /// Remove a user-added token. Built-in tokens cannot be removed.
    pub async fn remove_token(&self, address: &str, ledger_id: &str) -> Result<(), WalletError> {
        if self.base.iter().any(|t| t.ledger_id == ledger_id) {
            return Err(WalletError::validation(format!("Built-in token {} cannot be removed", ledger_id)));
        }

        {
            let mut state = self.state.write().await;
            let before = state.user.len();
            state.user.retain(|t| t.ledger_id != ledger_id);
            if state.user.len() == before {
                return Err(WalletError::not_found(format!("No user token with ledger {}", ledger_id)));
            }
            state.hidden.remove(ledger_id);
        }
        log::info!("Removed token {}", ledger_id);

        if let Err(e) = with_timeout(self.timeout, self.preferences.remove_custom_token(address, ledger_id)).await {
            log::warn!("Failed to remove custom token {} remotely: {}", ledger_id, e);
        }
        Ok(())
    }

    /// Hide or show a token and write the hidden list through.
    pub async fn set_hidden(&self, address: &str, token_id: &str, hidden: bool) -> Result<(), WalletError> {
        let ids = {
            let mut state = self.state.write().await;
            if !self.base.iter().chain(state.user.iter()).any(|t| t.id == token_id) {
                return Err(WalletError::not_found(format!("Unknown token {}", token_id)));
            }
            if hidden {
                state.hidden.insert(token_id.to_string());
            } else {
                state.hidden.remove(token_id);
            }
            let mut ids: Vec<TokenKey> = state.hidden.iter().cloned().collect();
            ids.sort();
            ids
        };

        if let Err(e) = with_timeout(self.timeout, self.preferences.save_hidden_tokens(address, &ids)).await {
            log::warn!("Failed to save hidden tokens for {}: {}", address, e);
        }
        Ok(())
    }

    fn ensure_absent(&self, state: &CatalogState, ledger_id: &str) -> Result<(), WalletError> {
        if state.contains_ledger(&self.base, ledger_id) {
            return Err(WalletError::conflict(format!(
                "Token with ledger {} is already in the catalog",
                ledger_id
            )));
        }
        Ok(())
    }
}
