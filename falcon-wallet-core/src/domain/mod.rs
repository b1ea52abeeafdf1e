//! Domain layer - entities and repositories
//!
//! This module contains the wallet's data model and the traits its remote
//! collaborators implement.

pub mod entities;
pub mod repositories;

// Re-export domain components
pub use entities::*;
pub use repositories::*; 