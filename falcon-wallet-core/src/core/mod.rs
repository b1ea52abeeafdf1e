//! Core wallet functionality
//!
//! This module contains the session state machine and everything that hangs
//! off the active address: token catalog, balances, prices, transaction
//! history and dashboard polling.

pub mod balances;
pub mod polling;
pub mod prices;
pub mod storage;
pub mod tokens;
pub mod transactions;
pub mod wallet;
