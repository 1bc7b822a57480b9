//! Event stream module for the ADX exchange.
//!
//! Push notifications (won auctions, delivered impressions, budget alerts)
//! arrive over a single persistent WebSocket as `{"type", "data"}` frames.
//! [`AdxEventStream`] keeps that connection alive across server drops,
//! replays subscriptions after every reconnect, and dispatches events to
//! registered handlers.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use adx::websocket::AdxEventStream;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut stream = AdxEventStream::new("wss://api.adx.luxfi.network/ws", "my-api-key");
//!
//!     stream.on("bid_won", |data| {
//!         println!("won: {}", data);
//!     }).await;
//!
//!     stream.connect().await?;
//!     stream.subscribe(vec!["bid_won".to_string(), "impression".to_string()]).await?;
//!
//!     // ... run until shutdown ...
//!     stream.close().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod handlers;
pub mod subscriptions;
pub mod types;

pub use client::{AdxEventStream, ConnectionState, StreamConfig};
pub use handlers::{EventHandler, HandlerId};
pub use subscriptions::SubscriptionSet;
pub use types::{EventEnvelope, SubscribeMessage};
