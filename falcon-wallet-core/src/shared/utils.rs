//! Utility functions for the wallet core
//!
//! This module contains common utility functions used throughout the wallet core:
//! token amount parsing and formatting, USD display helpers and address shortening.

use crate::shared::constants::MIN_FRACTION_DIGITS;
use crate::shared::error::WalletError;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use std::future::Future;
use std::time::Duration;

/// Insert `,` separators every three digits of an integer string.
pub fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Format a raw ledger amount for display.
///
/// Divides by `10^decimals`, groups the integer part en-US style and keeps
/// between two and `decimals` fractional digits (trailing zeros trimmed).
pub fn format_token_amount(amount: &BigUint, decimals: u8) -> String {
    let digits = amount.to_string();
    let scale = decimals as usize;
    let min_fraction = MIN_FRACTION_DIGITS.min(decimals) as usize;

    if scale == 0 {
        return group_thousands(&digits);
    }

    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };

    let split = padded.len() - scale;
    let (whole, fraction) = padded.split_at(split);
    let trimmed = fraction.trim_end_matches('0');
    let fraction = if trimmed.len() < min_fraction {
        &fraction[..min_fraction]
    } else {
        trimmed
    };

    if fraction.is_empty() {
        group_thousands(whole)
    } else {
        format!("{}.{}", group_thousands(whole), fraction)
    }
}

/// Parse user input into raw ledger units.
///
/// Accepts grouping commas, truncates fractional digits beyond `decimals`.
pub fn parse_token_amount(amount: &str, decimals: u8) -> Result<BigUint, WalletError> {
    let cleaned: String = amount.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(WalletError::validation("Amount cannot be empty"));
    }

    let parts: Vec<&str> = cleaned.split('.').collect();
    let (whole, fraction) = match parts.as_slice() {
        [whole] => (*whole, ""),
        [whole, fraction] => (*whole, *fraction),
        _ => return Err(WalletError::validation("Invalid amount format")),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(WalletError::validation("Invalid amount format"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(WalletError::validation(format!("Invalid amount: {}", amount)));
    }

    let scale = decimals as usize;
    let mut units = String::with_capacity(whole.len() + scale);
    units.push_str(if whole.is_empty() { "0" } else { whole });
    if fraction.len() > scale {
        units.push_str(&fraction[..scale]);
    } else {
        units.push_str(fraction);
        units.push_str(&"0".repeat(scale - fraction.len()));
    }

    units
        .parse::<BigUint>()
        .map_err(|e| WalletError::validation(format!("Invalid amount {}: {}", amount, e)))
}

/// Convert raw units into a floating point token amount for USD math.
pub fn to_decimal(amount: &BigUint, decimals: u8) -> f64 {
    if amount.is_zero() {
        return 0.0;
    }
    amount.to_f64().unwrap_or(0.0) / 10f64.powi(decimals as i32)
}

/// USD value of a raw amount at the given unit price
pub fn usd_value(amount: &BigUint, decimals: u8, usd_price: f64) -> f64 {
    to_decimal(amount, decimals) * usd_price
}

/// Format a USD price with precision that depends on magnitude.
pub fn format_usd_price(price: f64) -> String {
    if price == 0.0 {
        "$0.00".to_string()
    } else if price < 0.01 {
        format!("${:.6}", price)
    } else if price < 1.0 {
        format!("${:.4}", price)
    } else if price < 100.0 {
        format!("${:.2}", price)
    } else {
        let cents = format!("{:.2}", price);
        let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
        format!("${}.{}", group_thousands(whole), fraction)
    }
}

/// Signed 24h change for display
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    pub text: String,
    pub is_positive: bool,
}

pub fn format_price_change(change_pct: f64) -> PriceChange {
    let is_positive = change_pct >= 0.0;
    PriceChange {
        text: format!("{}{:.2}%", if is_positive { "+" } else { "" }, change_pct),
        is_positive,
    }
}

/// Shorten an address to `abcdef…wxyz` form.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Run a remote call under a deadline; an elapsed deadline becomes `WalletError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, WalletError>
where
    F: Future<Output = Result<T, WalletError>>,
{
    tokio::time::timeout(limit, call).await?
}
