//! Receive addresses
//!
//! Native ledger tokens are received on the user's own address. Wrapped
//! assets are received on the source chain, at an address the token's minter
//! derives for the user.

use crate::domain::entities::TokenDescriptor;
use crate::domain::repositories::CrossChainMinter;
use crate::shared::constants::AddressFamily;
use crate::shared::error::WalletError;
use crate::shared::types::Address;
use crate::shared::utils::with_timeout;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Where to send funds to credit `token` to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositAddress {
    pub address: String,
    /// Source chain for wrapped assets, `None` for native tokens
    pub source_chain: Option<String>,
    pub instruction: Option<String>,
}

pub struct DepositService {
    minter: Arc<dyn CrossChainMinter>,
    timeout: Duration,
}

impl DepositService {
    pub fn new(minter: Arc<dyn CrossChainMinter>, timeout: Duration) -> Self {
        Self { minter, timeout }
    }

    pub async fn deposit_address(&self, token: &TokenDescriptor, owner: &Address) -> Result<DepositAddress, WalletError> {
        let Some(info) = &token.cross_chain_info else {
            return Ok(DepositAddress {
                address: owner.clone(),
                source_chain: None,
                instruction: None,
            });
        };

        let minter_id = info.minter_id.as_deref().ok_or_else(|| {
            WalletError::validation(format!("{} does not support cross-chain deposits", token.symbol))
        })?;
        // BTC-family minters derive bitcoin addresses, everything else is EVM style
        let family = info.address_family.unwrap_or(if info.source_chain.eq_ignore_ascii_case("bitcoin") {
            AddressFamily::Bitcoin
        } else {
            AddressFamily::Ethereum
        });

        let address = with_timeout(self.timeout, self.minter.deposit_address(minter_id, family, owner)).await?;
        if address.trim().is_empty() {
            return Err(WalletError::ledger(format!(
                "Could not generate a {} deposit address",
                token.symbol
            )));
        }
        log::debug!("Deposit address for {} resolved via minter {}", token.symbol, minter_id);

        Ok(DepositAddress {
            address,
            source_chain: Some(info.source_chain.clone()),
            instruction: Some(info.deposit_instruction.clone()),
        })
    }
}
