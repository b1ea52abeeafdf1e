//! Token transfers
//!
//! Validates a send request against the live balance and hands it to the
//! token's ledger. The fee is paid on top of the amount.

use crate::domain::entities::TokenDescriptor;
use crate::domain::repositories::LedgerClient;
use crate::shared::error::WalletError;
use crate::shared::types::BlockIndex;
use crate::shared::utils::{format_token_amount, parse_token_amount, with_timeout};
use num_bigint::BigUint;
use num_traits::Zero;
use std::sync::Arc;
use std::time::Duration;

pub struct TransferService {
    ledger: Arc<dyn LedgerClient>,
    timeout: Duration,
}

impl TransferService {
    pub fn new(ledger: Arc<dyn LedgerClient>, timeout: Duration) -> Self {
        Self { ledger, timeout }
    }

    /// Send `amount` (decimal text) of `token` from `from` to `to`.
    ///
    /// Returns the ledger block index of the transfer.
    pub async fn send(
        &self,
        token: &TokenDescriptor,
        from: &str,
        to: &str,
        amount: &str,
    ) -> Result<BlockIndex, WalletError> {
        let to = to.trim();
        if to.is_empty() {
            return Err(WalletError::validation("Recipient address cannot be empty"));
        }

        let units = parse_token_amount(amount, token.decimals)?;
        if units.is_zero() {
            return Err(WalletError::validation("Transfer amount must be greater than zero"));
        }

        let balance = with_timeout(self.timeout, self.ledger.balance_of(&token.ledger_id, from)).await?;
        let total = &units + BigUint::from(token.transfer_fee);
        if total > balance {
            return Err(WalletError::insufficient_funds(format!(
                "Insufficient balance. You need {} {} (including fee)",
                format_token_amount(&total, token.decimals),
                token.symbol
            )));
        }

        log::info!(
            "Sending {} {} to {}",
            format_token_amount(&units, token.decimals),
            token.symbol,
            to
        );
        let block = with_timeout(self.timeout, self.ledger.transfer(&token.ledger_id, to, &units)).await?;
        log::info!("Transfer of {} landed in block {}", token.symbol, block);
        Ok(block)
    }
}
