//! Configuration objects for relay.
//!
//! This module contains re-exported configurations that are needed by relay.

// Re-exports.
pub use relay_config::shared::*;
