//! Browser environment ports
//!
//! Wallet extensions inject their APIs as globals; the identity provider is a
//! redirect-based login client. The host binds these traits to the real
//! objects. Probing is done per call since extensions may appear after load.

use crate::shared::error::WalletError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error object raised by an injected provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    /// EIP-1193 "user rejected request"
    pub const USER_REJECTED: i64 = 4001;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(Self::USER_REJECTED, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        if self.code == Self::USER_REJECTED {
            return true;
        }
        let message = self.message.to_ascii_lowercase();
        message.contains("rejected") || message.contains("denied") || message.contains("declined")
    }
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            WalletError::user_rejected(err.message)
        } else {
            WalletError::network(format!("Provider request failed: {}", err))
        }
    }
}

/// `window.ethereum`
#[async_trait]
pub trait EvmProvider: Send + Sync {
    /// `eth_requestAccounts`
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;
}

/// `window.solana`
#[async_trait]
pub trait SolanaProvider: Send + Sync {
    /// Returns the base58 public key of the authorized account
    async fn connect(&self, only_if_trusted: bool) -> Result<String, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;
}

/// `window.tronLink` / `window.tronWeb`
#[async_trait]
pub trait TronProvider: Send + Sync {
    /// `tron_requestAccounts`; the address is not part of the response
    async fn request_accounts(&self) -> Result<(), ProviderError>;

    /// `tronWeb.defaultAddress.base58`, filled in some time after approval
    fn default_address(&self) -> Option<String>;
}

/// Completion callback for the redirect login flow
pub type LoginCallback = Box<dyn FnOnce(Result<String, String>) + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOptions {
    pub identity_provider_url: String,
    pub max_time_to_live: Duration,
}

/// Federated identity client
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn is_authenticated(&self) -> bool;

    /// Principal text of the current identity, if any
    fn principal(&self) -> Option<String>;

    /// Start the login flow. Exactly one of success (principal) or failure
    /// (reason) is delivered through `on_complete`.
    fn login(&self, options: LoginOptions, on_complete: LoginCallback);

    async fn logout(&self) -> Result<(), ProviderError>;
}

/// Global objects visible to the page right now
pub trait BrowserEnvironment: Send + Sync {
    fn evm(&self) -> Option<Arc<dyn EvmProvider>>;

    fn solana(&self) -> Option<Arc<dyn SolanaProvider>>;

    fn tron(&self) -> Option<Arc<dyn TronProvider>>;

    fn identity(&self) -> Arc<dyn IdentityProvider>;
}
