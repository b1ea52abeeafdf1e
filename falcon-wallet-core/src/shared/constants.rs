//! Constants for the wallet core
//!
//! This module contains all constants used throughout the wallet core.

use serde::{Deserialize, Serialize};

// Storage constants
pub const STORAGE_NAMESPACE: &str = "falcon_wallet";
pub const SESSION_KEY_SUFFIX: &str = "session";

// Session constants
pub const IDENTITY_SESSION_DAYS: u64 = 7;
pub const IDENTITY_LOGIN_TIMEOUT_SECS: u64 = 300;
pub const TRON_POLL_INTERVAL_MS: u64 = 100;
pub const TRON_POLL_MAX_ATTEMPTS: u32 = 30;
pub const PLACEHOLDER_PLAN: &str = "Basic";
pub const PLACEHOLDER_ACCOUNT_STATUS: &str = "Pending";

// Remote call limits
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

// Polling intervals
pub const BALANCE_POLL_SECS: u64 = 10;
pub const PRICE_POLL_SECS: u64 = 60;
pub const TRANSACTION_POLL_SECS: u64 = 30;

// Price cache
pub const PRICE_TTL_SECS: u64 = 60;
pub const DEFAULT_STABLECOIN_KEYS: &[&str] = &["ckusdt"];

// Transaction history
pub const RECENT_TOKEN_LIMIT: usize = 4;
pub const RECENT_TRANSACTION_LIMIT: usize = 10;
pub const HISTORY_PAGE_SIZE: usize = 20;
pub const MINTER_COUNTERPARTY: &str = "Minter";
pub const BURN_COUNTERPARTY: &str = "Burned";

// ICRC-1 metadata keys
pub const METADATA_NAME: &str = "icrc1:name";
pub const METADATA_SYMBOL: &str = "icrc1:symbol";
pub const METADATA_DECIMALS: &str = "icrc1:decimals";
pub const METADATA_FEE: &str = "icrc1:fee";

// Amount formatting
pub const MIN_FRACTION_DIGITS: u8 = 2;

/// Which address derivation a minter uses for deposits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    Bitcoin,
    Ethereum,
}

// Token configurations
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub id: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub ledger_id: &'static str,
    pub decimals: u8,
    pub fee: u64,
    pub logo: &'static str,
    /// (source chain, deposit instruction, minter id, address family)
    pub deposit: Option<(&'static str, &'static str, &'static str, AddressFamily)>,
}

pub static ICP_TOKEN: TokenConfig = TokenConfig {
    id: "icp",
    symbol: "ICP",
    name: "Internet Computer",
    ledger_id: "ryjl3-tyaaa-aaaaa-aaaba-cai",
    decimals: 8,
    fee: 10_000,
    logo: "https://cryptologos.cc/logos/internet-computer-icp-logo.png",
    deposit: None,
};

pub static CKBTC_TOKEN: TokenConfig = TokenConfig {
    id: "ckbtc",
    symbol: "ckBTC",
    name: "Chain Key Bitcoin",
    ledger_id: "mxzaz-hqaaa-aaaar-qaada-cai",
    decimals: 8,
    fee: 10,
    logo: "https://cryptologos.cc/logos/bitcoin-btc-logo.png",
    deposit: Some((
        "Bitcoin",
        "Send Bitcoin to this address to receive ckBTC",
        "mqygn-kiaaa-aaaar-qaadq-cai",
        AddressFamily::Bitcoin,
    )),
};

pub static CKETH_TOKEN: TokenConfig = TokenConfig {
    id: "cketh",
    symbol: "ckETH",
    name: "Chain Key Ethereum",
    ledger_id: "ss2fx-dyaaa-aaaar-qacoq-cai",
    decimals: 18,
    fee: 2_000_000_000_000,
    logo: "https://cryptologos.cc/logos/ethereum-eth-logo.png",
    deposit: Some((
        "Ethereum",
        "Send Ethereum to this address to receive ckETH",
        "sv3dd-oaaaa-aaaar-qacoa-cai",
        AddressFamily::Ethereum,
    )),
};

pub static CKUSDT_TOKEN: TokenConfig = TokenConfig {
    id: "ckusdt",
    symbol: "ckUSDT",
    name: "Chain Key Tether",
    ledger_id: "cngnf-vqaaa-aaaar-qag4q-cai",
    decimals: 6,
    fee: 10_000,
    logo: "https://cryptologos.cc/logos/tether-usdt-logo.png",
    deposit: Some((
        "Ethereum",
        "Send USDT (ERC-20) to this address to receive ckUSDT",
        "jzenf-aiaaa-aaaar-qaa7q-cai",
        AddressFamily::Ethereum,
    )),
};

pub static BUILTIN_TOKENS: [&TokenConfig; 4] = [&ICP_TOKEN, &CKBTC_TOKEN, &CKETH_TOKEN, &CKUSDT_TOKEN];

// Development and testing constants
pub const LOG_LEVEL: &str = if cfg!(debug_assertions) { "debug" } else { "info" };
