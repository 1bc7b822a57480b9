//! Wire types for the ADX event stream protocol.
//!
//! Inbound frames carry a `{"type": <string>, "data": <any>}` envelope;
//! the single outbound control message is
//! `{"type": "subscribe", "events": [...]}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound event envelope. Frames without a `type` fail to parse and are
/// dropped by the read loop.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    /// Event name used to select handlers, e.g. `bid_won`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload, handed to handlers as is.
    #[serde(default)]
    pub data: Value,
}

/// Outbound subscription control message.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeMessage {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub events: Vec<String>,
}

impl SubscribeMessage {
    /// Create a subscribe message for the given event names.
    pub fn new(events: Vec<String>) -> Self {
        Self {
            type_: "subscribe",
            events,
        }
    }
}
