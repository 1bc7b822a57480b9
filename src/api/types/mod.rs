//! Request and response types for the ADX REST API, organized by category.

pub mod analytics;
pub mod miner;
pub mod vast;

// Re-export all types for convenience
pub use analytics::*;
pub use miner::*;
pub use vast::*;
