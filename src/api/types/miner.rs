//! Home-miner participant types.
//!
//! Miners are edge nodes that cache and serve ad creatives for the exchange's
//! distributed delivery network (nothing blockchain-related despite the name).
//! Wire naming is camelCase, pinned by the serde rename tables and tests.
//! Earnings and payouts are ledger money: decimal strings on the wire,
//! [`Decimal`] in memory.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AdxError, AdxResult};

/// Physical location of a miner node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLocation {
    /// ISO country code.
    pub country: String,
    pub region: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
}

/// Hardware profile of a miner node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hardware {
    pub cpu_cores: u32,
    pub memory_gb: u32,
    pub disk_gb: u32,
    pub network_mbps: u32,
}

/// Registration payload for `POST /miner/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinerConfig {
    /// Payout wallet address.
    pub wallet_address: String,
    /// URL the exchange can reach this node at.
    pub public_url: String,
    /// Creative cache capacity, e.g. `"100GB"`.
    pub cache_size: String,
    pub location: GeoLocation,
    pub hardware: Hardware,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

impl MinerConfig {
    /// Validate registration invariants before any network call.
    pub fn validate(&self) -> AdxResult<()> {
        if self.wallet_address.is_empty() {
            return Err(AdxError::Validation(
                "miner wallet address must not be empty".to_string(),
            ));
        }
        if self.public_url.is_empty() {
            return Err(AdxError::Validation(
                "miner public url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Operational status of a miner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinerStatus {
    Online,
    Offline,
    Maintenance,
}

impl MinerStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Maintenance => "maintenance",
        }
    }
}

/// Body of `PUT /miner/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerStatusUpdate {
    pub status: MinerStatus,
}

/// Response for `POST /miner/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinerRegistration {
    /// Exchange-assigned miner id.
    pub miner_id: String,
    pub status: String,
    /// Registration timestamp as returned by the server.
    pub registered_at: String,
    /// Event-stream URL this miner should connect to.
    pub websocket_url: String,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Response for `GET /miner/{id}/earnings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinerEarnings {
    pub miner_id: String,
    /// Lifetime earnings, decimal string on the wire.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_earnings: Decimal,
    /// Earned but not yet paid out, decimal string on the wire.
    #[serde(with = "rust_decimal::serde::str")]
    pub pending_payout: Decimal,
    /// Timestamp of the last payout as returned by the server.
    pub last_payout: String,
    pub total_impressions: u64,
    /// Bytes served over the reporting period.
    pub total_bandwidth: u64,
    /// Reporting period label, e.g. `"30d"`.
    pub period: String,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}
