//! Wallet session entity
//!
//! Snapshot of the connection state published by the wallet session. Only
//! the session itself constructs transitions; consumers read clones.

use crate::shared::constants::{PLACEHOLDER_ACCOUNT_STATUS, PLACEHOLDER_PLAN};
use crate::shared::types::{Address, ProviderKind, SessionStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSessionState {
    pub status: SessionStatus,
    pub address: Option<Address>,
    pub provider_kind: Option<ProviderKind>,
    pub chain_id: Option<String>,
    pub last_error: Option<String>,
    pub is_authenticated: bool,
    pub plan: Option<String>,
    pub account_status: Option<String>,
}

impl WalletSessionState {
    /// Fresh connected state for a provider and address
    pub fn connected(kind: ProviderKind, address: Address) -> Self {
        Self {
            status: SessionStatus::Connected,
            address: Some(address),
            provider_kind: Some(kind),
            chain_id: Some(kind.chain_tag().to_string()),
            ..Self::default()
        }
    }

    /// Failed connect attempt with a human readable cause
    pub fn failed(cause: impl Into<String>) -> Self {
        Self {
            status: SessionStatus::Error,
            last_error: Some(cause.into()),
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.status == SessionStatus::Connecting
    }

    /// Address and provider are present exactly when connected.
    pub fn is_consistent(&self) -> bool {
        self.address.is_some() == self.is_connected()
            && self.provider_kind.is_some() == self.address.is_some()
    }

    /// Optimistic login values applied before the backend answers
    pub fn mark_authenticated_optimistically(&mut self) {
        self.is_authenticated = true;
        self.plan = Some(PLACEHOLDER_PLAN.to_string());
        self.account_status = Some(PLACEHOLDER_ACCOUNT_STATUS.to_string());
    }

    pub fn apply_profile(&mut self, profile: &UserProfile) {
        if let Some(plan) = &profile.plan {
            self.plan = Some(plan.clone());
        }
        self.account_status = Some(profile.status.clone());
    }
}

/// The single record kept in durable storage between reloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub provider_kind: ProviderKind,
    pub address: Address,
}

/// Profile returned by the backend login call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub plan: Option<String>,
    pub status: String,
}
