use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::error::WalletError;

// Basic types for wallet operations
pub type Address = String;
pub type LedgerId = String;
pub type TokenKey = String;
pub type BlockIndex = u64;

// Network targets - local replica or IC mainnet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    #[default]
    Local,
    #[serde(alias = "ic")]
    Mainnet,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Local => "Local Replica",
            Network::Mainnet => "Internet Computer",
        }
    }

    pub fn host(&self) -> &'static str {
        match self {
            Network::Local => "http://localhost:4943",
            Network::Mainnet => "https://ic0.app",
        }
    }

    /// The identity provider is always the production one; there is no
    /// local identity canister.
    pub fn identity_provider_url(&self) -> &'static str {
        "https://identity.ic0.app"
    }

    /// Local replicas need their root key fetched before certified calls.
    pub fn requires_root_key_fetch(&self) -> bool {
        matches!(self, Network::Local)
    }
}

impl FromStr for Network {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Network::Local),
            "ic" | "mainnet" => Ok(Network::Mainnet),
            other => Err(WalletError::config(format!("Unknown network: {}", other))),
        }
    }
}

/// Wallet provider families the session can connect through.
///
/// Absence of a provider is expressed as `Option<ProviderKind>::None`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    InjectedEvm,
    InjectedSolana,
    InjectedTron,
    FederatedIdentity,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::InjectedEvm,
        ProviderKind::InjectedSolana,
        ProviderKind::InjectedTron,
        ProviderKind::FederatedIdentity,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::InjectedEvm => "MetaMask",
            ProviderKind::InjectedSolana => "Phantom",
            ProviderKind::InjectedTron => "TronLink",
            ProviderKind::FederatedIdentity => "Internet Identity",
        }
    }

    /// Where the user can get the extension when it is missing.
    pub fn install_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::InjectedEvm => Some("https://metamask.io/download/"),
            ProviderKind::InjectedSolana => Some("https://phantom.app/download"),
            ProviderKind::InjectedTron => Some("https://www.tronlink.org/"),
            ProviderKind::FederatedIdentity => None,
        }
    }

    /// Chain tag recorded on the session after a successful connect.
    pub fn chain_tag(&self) -> &'static str {
        match self {
            ProviderKind::InjectedEvm => "evm",
            ProviderKind::InjectedSolana => "solana",
            ProviderKind::InjectedTron => "tron",
            ProviderKind::FederatedIdentity => "icp",
        }
    }

    pub fn requires_extension(&self) -> bool {
        !matches!(self, ProviderKind::FederatedIdentity)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Connection lifecycle of the wallet session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TxDirection {
    Send,
    Receive,
}

impl FromStr for TxDirection {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "send" => Ok(TxDirection::Send),
            "receive" => Ok(TxDirection::Receive),
            other => Err(WalletError::validation(format!("Unknown transaction type: {}", other))),
        }
    }
}

/// Where a transaction record came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceSystem {
    Backend,
    LedgerDirect,
}
