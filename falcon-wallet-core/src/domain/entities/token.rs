//! Token entities for the wallet core

use crate::shared::constants::{
    AddressFamily, TokenConfig, METADATA_DECIMALS, METADATA_FEE, METADATA_NAME, METADATA_SYMBOL,
};
use crate::shared::error::WalletError;
use crate::shared::types::{LedgerId, TokenKey};
use crate::shared::utils::format_token_amount;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

/// How to bring an external chain's asset onto the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainInfo {
    pub source_chain: String,
    pub deposit_instruction: String,
    #[serde(default)]
    pub minter_id: Option<LedgerId>,
    #[serde(default)]
    pub address_family: Option<AddressFamily>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub id: TokenKey,
    pub name: String,
    pub symbol: String,
    pub ledger_id: LedgerId,
    pub decimals: u8,
    pub transfer_fee: u64,
    pub logo: Option<String>,
    pub cross_chain_info: Option<CrossChainInfo>,
    pub is_user_added: bool,
}

impl TokenDescriptor {
    /// User-added token built from validated ledger metadata
    pub fn user_added(ledger_id: impl Into<LedgerId>, metadata: TokenMetadata) -> Self {
        let ledger_id = ledger_id.into();
        Self {
            id: ledger_id.clone(),
            name: metadata.name,
            symbol: metadata.symbol,
            ledger_id,
            decimals: metadata.decimals,
            transfer_fee: metadata.fee,
            logo: None,
            cross_chain_info: None,
            is_user_added: true,
        }
    }

    /// Key used for price lookups (`icp`, `ckbtc`, ...)
    pub fn price_key(&self) -> TokenKey {
        self.symbol.to_ascii_lowercase()
    }

    pub fn is_cross_chain(&self) -> bool {
        self.cross_chain_info.is_some()
    }
}

impl From<&TokenConfig> for TokenDescriptor {
    fn from(config: &TokenConfig) -> Self {
        Self {
            id: config.id.to_string(),
            name: config.name.to_string(),
            symbol: config.symbol.to_string(),
            ledger_id: config.ledger_id.to_string(),
            decimals: config.decimals,
            transfer_fee: config.fee,
            logo: Some(config.logo.to_string()),
            cross_chain_info: config.deposit.map(|(chain, instruction, minter, family)| CrossChainInfo {
                source_chain: chain.to_string(),
                deposit_instruction: instruction.to_string(),
                minter_id: Some(minter.to_string()),
                address_family: Some(family),
            }),
            is_user_added: false,
        }
    }
}

/// A raw metadata value as exposed by an ICRC-1 ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataValue {
    Nat(BigUint),
    Int(i64),
    Text(String),
    Blob(Vec<u8>),
}

/// The standard fields every ICRC-1 ledger must expose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub fee: u64,
}

impl TokenMetadata {
    /// Extract the standard fields, rejecting ledgers that lack any of them.
    pub fn from_entries(entries: &[(String, MetadataValue)]) -> Result<Self, WalletError> {
        let find = |key: &str| {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v)
                .ok_or_else(|| WalletError::invalid_token(format!("Ledger metadata is missing {}", key)))
        };

        let text = |key: &str| -> Result<String, WalletError> {
            match find(key)? {
                MetadataValue::Text(value) if !value.trim().is_empty() => Ok(value.clone()),
                other => Err(WalletError::invalid_token(format!("{} has unexpected value {:?}", key, other))),
            }
        };

        let nat = |key: &str| -> Result<u64, WalletError> {
            match find(key)? {
                MetadataValue::Nat(value) => value
                    .to_u64()
                    .ok_or_else(|| WalletError::invalid_token(format!("{} is out of range", key))),
                MetadataValue::Int(value) if *value >= 0 => Ok(*value as u64),
                other => Err(WalletError::invalid_token(format!("{} has unexpected value {:?}", key, other))),
            }
        };

        let decimals = nat(METADATA_DECIMALS)?;
        let decimals = u8::try_from(decimals)
            .map_err(|_| WalletError::invalid_token(format!("decimals {} is out of range", decimals)))?;

        Ok(Self {
            name: text(METADATA_NAME)?,
            symbol: text(METADATA_SYMBOL)?,
            decimals,
            fee: nat(METADATA_FEE)?,
        })
    }
}

/// Balance of one token for the active address. Recomputed every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceEntry {
    pub token: TokenDescriptor,
    pub raw_balance: BigUint,
    pub formatted_balance: String,
}

impl BalanceEntry {
    pub fn new(token: TokenDescriptor, raw_balance: BigUint) -> Self {
        let formatted_balance = format_token_amount(&raw_balance, token.decimals);
        Self {
            token,
            raw_balance,
            formatted_balance,
        }
    }

    pub fn zero(token: TokenDescriptor) -> Self {
        Self::new(token, BigUint::zero())
    }

    /// Largest amount that can be sent once the transfer fee is paid
    pub fn max_sendable(&self) -> BigUint {
        let fee = BigUint::from(self.token.transfer_fee);
        if self.raw_balance > fee {
            &self.raw_balance - fee
        } else {
            BigUint::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{CKBTC_TOKEN, ICP_TOKEN};

    fn icp_metadata() -> Vec<(String, MetadataValue)> {
        vec![
            (METADATA_NAME.to_string(), MetadataValue::Text("Internet Computer".to_string())),
            (METADATA_SYMBOL.to_string(), MetadataValue::Text("ICP".to_string())),
            (METADATA_DECIMALS.to_string(), MetadataValue::Nat(BigUint::from(8u8))),
            (METADATA_FEE.to_string(), MetadataValue::Nat(BigUint::from(10_000u32))),
        ]
    }

    #[test]
    fn test_descriptor_from_config() {
        let icp = TokenDescriptor::from(&ICP_TOKEN);
        assert_eq!(icp.price_key(), "icp");
        assert!(!icp.is_user_added);
        assert!(!icp.is_cross_chain());

        let ckbtc = TokenDescriptor::from(&CKBTC_TOKEN);
        let info = ckbtc.cross_chain_info.expect("ckBTC has deposit info");
        assert_eq!(info.source_chain, "Bitcoin");
        assert_eq!(info.address_family, Some(AddressFamily::Bitcoin));
    }

    #[test]
    fn test_metadata_extraction() {
        let metadata = TokenMetadata::from_entries(&icp_metadata()).expect("Failed to read metadata");
        assert_eq!(metadata.symbol, "ICP");
        assert_eq!(metadata.decimals, 8);
        assert_eq!(metadata.fee, 10_000);
    }

    #[test]
    fn test_metadata_missing_field_is_invalid_token() {
        let mut entries = icp_metadata();
        entries.retain(|(k, _)| k != METADATA_FEE);
        let result = TokenMetadata::from_entries(&entries);
        assert!(matches!(result, Err(WalletError::InvalidToken(_))));
    }

    #[test]
    fn test_metadata_wrong_shape_is_invalid_token() {
        let mut entries = icp_metadata();
        entries[2].1 = MetadataValue::Text("eight".to_string());
        assert!(matches!(TokenMetadata::from_entries(&entries), Err(WalletError::InvalidToken(_))));
    }

    #[test]
    fn test_balance_entry_formatting() {
        let entry = BalanceEntry::new(TokenDescriptor::from(&ICP_TOKEN), BigUint::from(150_000_000u64));
        assert_eq!(entry.formatted_balance, "1.50");
        assert_eq!(entry.max_sendable(), BigUint::from(149_990_000u64));

        let empty = BalanceEntry::zero(TokenDescriptor::from(&ICP_TOKEN));
        assert_eq!(empty.formatted_balance, "0.00");
        assert!(empty.max_sendable().is_zero());
    }
}
