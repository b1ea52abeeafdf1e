//! Transaction entities for the wallet core

use crate::domain::entities::token::TokenDescriptor;
use crate::shared::constants::{BURN_COUNTERPARTY, MINTER_COUNTERPARTY};
use crate::shared::types::{Address, BlockIndex, SourceSystem, TxDirection};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const NANOS_PER_MILLI: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub direction: TxDirection,
    pub counterparty_from: String,
    pub counterparty_to: String,
    pub amount: BigUint,
    pub token_symbol: String,
    pub token_decimals: u8,
    pub source_system: SourceSystem,
}

impl TransactionRecord {
    /// Display hash derived from the ledger block index
    pub fn hash(&self) -> String {
        match self.id.parse::<u64>() {
            Ok(index) => format!("0x{:x}", index),
            Err(_) => self.id.clone(),
        }
    }

    pub fn involves(&self, address: &str) -> bool {
        self.counterparty_from == address || self.counterparty_to == address
    }
}

/// Newest first. Equal timestamps fall back to id, then token symbol, so
/// repeated merges of the same input produce the same order.
pub fn newest_first(a: &TransactionRecord, b: &TransactionRecord) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.token_symbol.cmp(&b.token_symbol))
}

/// Operation recorded in a ledger block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerOperation {
    Transfer { from: Address, to: Address, amount: BigUint },
    Mint { to: Address, amount: BigUint },
    Burn { from: Address, amount: BigUint },
}

/// Raw entry from a ledger's transaction log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: BlockIndex,
    pub timestamp_nanos: u64,
    pub operation: LedgerOperation,
}

impl LedgerTransaction {
    /// Convert into a record from `account`'s point of view.
    ///
    /// Returns `None` when the account is neither sender nor receiver.
    pub fn to_record(&self, account: &str, token: &TokenDescriptor) -> Option<TransactionRecord> {
        let (direction, from, to, amount) = match &self.operation {
            LedgerOperation::Transfer { from, to, amount } => {
                let direction = if from == account { TxDirection::Send } else { TxDirection::Receive };
                (direction, from.clone(), to.clone(), amount.clone())
            }
            LedgerOperation::Mint { to, amount } => {
                (TxDirection::Receive, MINTER_COUNTERPARTY.to_string(), to.clone(), amount.clone())
            }
            LedgerOperation::Burn { from, amount } => {
                (TxDirection::Send, from.clone(), BURN_COUNTERPARTY.to_string(), amount.clone())
            }
        };

        let record = TransactionRecord {
            id: self.id.to_string(),
            timestamp: self.timestamp_nanos / NANOS_PER_MILLI,
            direction,
            counterparty_from: from,
            counterparty_to: to,
            amount,
            token_symbol: token.symbol.clone(),
            token_decimals: token.decimals,
            source_system: SourceSystem::LedgerDirect,
        };
        record.involves(account).then_some(record)
    }
}

/// One page of history plus an approximate continuation flag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionPage {
    pub records: Vec<TransactionRecord>,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::CKBTC_TOKEN;

    fn ckbtc() -> TokenDescriptor {
        TokenDescriptor::from(&CKBTC_TOKEN)
    }

    #[test]
    fn test_transfer_direction() {
        let tx = LedgerTransaction {
            id: 255,
            timestamp_nanos: 1_700_000_000_000_000_000,
            operation: LedgerOperation::Transfer {
                from: "alice".to_string(),
                to: "bob".to_string(),
                amount: BigUint::from(500u32),
            },
        };

        let sent = tx.to_record("alice", &ckbtc()).expect("alice is involved");
        assert_eq!(sent.direction, TxDirection::Send);
        assert_eq!(sent.timestamp, 1_700_000_000_000);
        assert_eq!(sent.hash(), "0xff");
        assert_eq!(sent.token_symbol, "ckBTC");
        assert_eq!(sent.source_system, SourceSystem::LedgerDirect);

        let received = tx.to_record("bob", &ckbtc()).expect("bob is involved");
        assert_eq!(received.direction, TxDirection::Receive);

        assert!(tx.to_record("carol", &ckbtc()).is_none());
    }

    #[test]
    fn test_mint_and_burn_counterparties() {
        let mint = LedgerTransaction {
            id: 1,
            timestamp_nanos: 0,
            operation: LedgerOperation::Mint { to: "alice".to_string(), amount: BigUint::from(1u8) },
        };
        let record = mint.to_record("alice", &ckbtc()).expect("mint to alice");
        assert_eq!(record.counterparty_from, MINTER_COUNTERPARTY);
        assert_eq!(record.direction, TxDirection::Receive);

        let burn = LedgerTransaction {
            id: 2,
            timestamp_nanos: 0,
            operation: LedgerOperation::Burn { from: "alice".to_string(), amount: BigUint::from(1u8) },
        };
        let record = burn.to_record("alice", &ckbtc()).expect("burn from alice");
        assert_eq!(record.counterparty_to, BURN_COUNTERPARTY);
        assert_eq!(record.direction, TxDirection::Send);
    }

    #[test]
    fn test_newest_first_is_stable_on_ties() {
        let make = |id: &str, timestamp: u64| TransactionRecord {
            id: id.to_string(),
            timestamp,
            direction: TxDirection::Receive,
            counterparty_from: "a".to_string(),
            counterparty_to: "b".to_string(),
            amount: BigUint::from(1u8),
            token_symbol: "ICP".to_string(),
            token_decimals: 8,
            source_system: SourceSystem::LedgerDirect,
        };
        let mut records = vec![make("2", 50), make("1", 50), make("3", 100)];
        records.sort_by(newest_first);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }
}
