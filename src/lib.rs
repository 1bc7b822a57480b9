//! # ADX Rust SDK
//!
//! A Rust SDK for the Luxfi ADX real-time bidding exchange.
//!
//! ## Modules
//!
//! This SDK provides three main modules:
//! - [`openrtb`]: Typed OpenRTB bid request/response schema with lossless
//!   extension handling
//! - [`api`]: REST client for bidding, VAST/ad-pod retrieval, analytics,
//!   miner operations, and delivery reporting
//! - [`websocket`]: Persistent event stream with automatic reconnect and
//!   durable subscriptions
//!
//! Plus the shared [`error`] taxonomy and [`network`] URL helpers.
//!
//! ## Quick Start: bidding
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
//!
//!     let response = client.bid_request(&request).await?;
//!     if let Some(bid) = response.bids().next() {
//!         println!("best bid: {} on {}", bid.price, bid.impid);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Quick Start: event stream
//!
//! ```rust,ignore
//! let mut stream = client.event_stream();
//! stream.on("bid_won", |data| println!("won: {}", data)).await;
//! stream.connect().await?;
//! stream.subscribe(vec!["bid_won".to_string()]).await?;
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// Unified error taxonomy shared by every SDK operation.
pub mod error;

/// Endpoint constants and http↔ws URL derivation.
pub mod network;

/// OpenRTB schema layer: bid request/response types and validation.
pub mod openrtb;

/// REST API client for the exchange's request/response endpoints.
#[cfg(feature = "http")]
pub mod api;

/// WebSocket event stream client with reconnect and durable subscriptions.
#[cfg(feature = "ws")]
pub mod websocket;

// ============================================================================
// PRELUDE
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use adx::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{AdxError, AdxResult};

    pub use crate::openrtb::{
        App, Banner, Bid, BidRequest, BidResponse, Creative, Device, Format, Geo, Impression,
        InventoryContext, Native, NoBidReason, Regs, SeatBid, Site, User, Video,
    };

    pub use crate::network::{ws_url, DEFAULT_API_URL};

    #[cfg(feature = "http")]
    pub use crate::api::{
        AdPodRequest, AdPodResponse, AdxClient, AdxClientBuilder, AnalyticsParams,
        AnalyticsResponse, DailyStat, GeoLocation, Hardware, MinerConfig, MinerEarnings,
        MinerRegistration, MinerStatus, PodAd, TimeRange, VastParams, ViewabilityReport,
    };

    #[cfg(feature = "ws")]
    pub use crate::websocket::{
        AdxEventStream, ConnectionState, EventEnvelope, HandlerId, StreamConfig, SubscribeMessage,
    };
}
