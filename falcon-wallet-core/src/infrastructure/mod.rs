//! Infrastructure layer - platform-specific implementations
//!
//! This module contains platform storage, the browser environment ports and
//! the HTTP adapter for the application backend.

pub mod platform;
pub mod browser;
pub mod http;

// Re-export infrastructure components
pub use platform::*;
pub use browser::*;
pub use http::{HttpBackend, OfflineBackend};
