//! Error handling for the wallet core
//!
//! This module defines the error types used throughout the wallet core.
//! Provider and network failures are turned into state fields or fallback
//! values at operation boundaries; the variants here are what those
//! boundaries see.

use thiserror::Error;

/// Wallet error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// No wallet extension installed for the requested provider
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The user explicitly declined the connection or approval request
    #[error("Request rejected by user: {0}")]
    UserRejected(String),

    /// The provider never produced a usable address
    #[error("Address unresolved: {0}")]
    AddressUnresolved(String),

    #[error("Ledger call failed: {0}")]
    LedgerCallFailed(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// Create a provider unavailable error
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::ProviderUnavailable(message.into())
    }

    /// Create a user rejected error
    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::UserRejected(message.into())
    }

    /// Create an address unresolved error
    pub fn address_unresolved(message: impl Into<String>) -> Self {
        Self::AddressUnresolved(message.into())
    }

    /// Create a ledger call error
    pub fn ledger(message: impl Into<String>) -> Self {
        Self::LedgerCallFailed(message.into())
    }

    /// Create an invalid token error
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    /// Create a backend unavailable error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::BackendUnavailable(message.into())
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn insufficient_funds(message: impl Into<String>) -> Self {
        Self::InsufficientFunds(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the user can retry or continue after this error.
    ///
    /// Only configuration, storage and internal failures are treated as
    /// non-recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Storage(_) | Self::Internal(_))
    }

    /// Whether the failure came from a remote peer rather than local input
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::LedgerCallFailed(_)
                | Self::BackendUnavailable(_)
                | Self::Network(_)
                | Self::Timeout(_)
        )
    }
}

// Standard library error conversions
impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("JSON error: {}", err))
    }
}

impl From<config::ConfigError> for WalletError {
    fn from(err: config::ConfigError) -> Self {
        Self::config(format!("Config error: {}", err))
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("HTTP request timed out: {}", err))
        } else {
            Self::network(format!("HTTP error: {}", err))
        }
    }
}

impl From<tokio::task::JoinError> for WalletError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("Task join error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for WalletError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::timeout(format!("Deadline elapsed: {}", err))
    }
}
