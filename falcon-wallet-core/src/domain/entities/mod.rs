//! Domain entities and value objects
//!
//! This module contains the core domain entities and value objects
//! that represent the business concepts in the wallet system.

pub mod session;
pub mod token;
pub mod price;
pub mod transaction;

// Re-export entities
pub use session::*;
pub use token::*;
pub use price::*;
pub use transaction::*;
