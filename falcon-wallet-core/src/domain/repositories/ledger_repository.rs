//! Ledger and minter access
//!
//! This module defines the seams through which the core reaches token ledgers
//! and cross-chain minters. Implementations live outside the core (agent
//! bindings, test fakes); the core only depends on these traits.

use crate::domain::entities::{LedgerTransaction, MetadataValue};
use crate::shared::constants::AddressFamily;
use crate::shared::error::WalletError;
use crate::shared::types::BlockIndex;
use async_trait::async_trait;
use num_bigint::BigUint;

/// ICRC-1 style ledger query and transfer interface
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Balance of `owner` on the ledger identified by `ledger_id`
    async fn balance_of(&self, ledger_id: &str, owner: &str) -> Result<BigUint, WalletError>;

    /// Raw metadata entries (`icrc1:name`, `icrc1:decimals`, ...)
    async fn metadata(&self, ledger_id: &str) -> Result<Vec<(String, MetadataValue)>, WalletError>;

    /// Transfer from the connected identity; returns the block index on success
    async fn transfer(&self, ledger_id: &str, to: &str, amount: &BigUint) -> Result<BlockIndex, WalletError>;

    /// A window of the ledger's transaction log
    async fn transactions(
        &self,
        ledger_id: &str,
        start: u64,
        length: u64,
    ) -> Result<Vec<LedgerTransaction>, WalletError>;
}

/// Minter for wrapped assets
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrossChainMinter: Send + Sync {
    /// Deposit address on the source chain for `owner`
    async fn deposit_address(
        &self,
        minter_id: &str,
        family: AddressFamily,
        owner: &str,
    ) -> Result<String, WalletError>;
}
