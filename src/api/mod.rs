//! REST API client module for the ADX exchange.
//!
//! [`AdxClient`] provides one method per exchange capability: OpenRTB bid
//! submission, VAST and CTV ad-pod retrieval, publisher analytics, miner
//! registration and lifecycle, and impression/viewability reporting.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use adx::api::AdxClient;
//! use adx::openrtb::{BidRequest, Impression};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AdxClient::new("https://api.adx.luxfi.network", "my-api-key")?;
//!
//!     let request = BidRequest::new(
//!         "req-1",
//!         vec![Impression::new("imp-1").with_bid_floor(0.5, "USD")],
//!     );
//!     let response = client.bid_request(&request).await?;
//!     for bid in response.bids() {
//!         println!("{} bid {} on {}", bid.id, bid.price, bid.impid);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Client Configuration
//!
//! Use the builder for custom configuration:
//!
//! ```rust,ignore
//! use adx::api::AdxClient;
//! use std::time::Duration;
//!
//! let client = AdxClient::builder("https://api.adx.luxfi.network", "my-api-key")
//!     .timeout(Duration::from_secs(3))
//!     .header("X-Trace-Id", "abc123")
//!     .build()?;
//! ```
//!
//! # Error Handling
//!
//! All methods return [`AdxResult<T>`](crate::error::AdxResult). The client
//! never retries; it classifies each failure (authentication, rate limit,
//! validation, timeout, network) and surfaces it immediately so callers can
//! apply their own retry policy.

pub mod client;
pub mod types;

// Re-export main types for convenience
pub use client::{AdxClient, AdxClientBuilder};
pub use types::*;
