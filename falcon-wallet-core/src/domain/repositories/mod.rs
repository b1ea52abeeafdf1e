//! Domain repositories
//!
//! This module contains the traits for remote data access
//! following Domain-Driven Design principles.

pub mod ledger_repository;
pub mod backend_repository;

// Re-export repositories
pub use ledger_repository::*;
pub use backend_repository::*;
