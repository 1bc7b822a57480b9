//! VAST creative, CTV ad pod, and delivery-reporting types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AdxError, AdxResult};

/// Query profile for `GET /vast`: pixel dimensions plus duration, with
/// room for extra exchange-specific query pairs.
#[derive(Debug, Clone)]
pub struct VastParams {
    /// Player width in pixels (`w` on the wire).
    pub width: u32,
    /// Player height in pixels (`h` on the wire).
    pub height: u32,
    /// Desired creative duration in seconds (`dur` on the wire).
    pub duration: u32,
    /// Additional query pairs, appended as given.
    pub extra: Vec<(String, String)>,
}

impl VastParams {
    /// Create VAST params for the given player size and duration.
    pub fn new(width: u32, height: u32, duration: u32) -> Self {
        Self {
            width,
            height,
            duration,
            extra: Vec::new(),
        }
    }

    /// Append an extra query pair.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }
}

/// Request body for `POST /ctv/pod`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdPodRequest {
    /// Ad-break slot identifier.
    pub slot_id: String,
    /// Pod duration in seconds.
    pub duration: u32,
    /// Free-form playback context forwarded to the pod assembler.
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub context: Map<String, Value>,
}

impl AdPodRequest {
    /// Create a pod request for a slot and duration.
    pub fn new(slot_id: impl Into<String>, duration: u32) -> Self {
        Self {
            slot_id: slot_id.into(),
            duration,
            context: Map::new(),
        }
    }

    /// Attach a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Validate pod-request invariants before any network call.
    pub fn validate(&self) -> AdxResult<()> {
        if self.slot_id.is_empty() {
            return Err(AdxError::Validation(
                "ad pod slot id must not be empty".to_string(),
            ));
        }
        if self.duration == 0 {
            return Err(AdxError::Validation(
                "ad pod duration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One ad selected into a pod.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodAd {
    pub id: String,
    /// VAST XML for this ad.
    pub creative: String,
    /// Ad duration in seconds.
    pub duration: u32,
    /// Clearing price in CPM.
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertiser_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Vec<String>>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Response for `POST /ctv/pod`: the assembled ad break.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdPodResponse {
    pub id: String,
    /// Selected ads in playback order.
    #[serde(default)]
    pub ads: Vec<PodAd>,
    /// Sum of ad durations in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u32>,
    /// Sum of clearing prices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Quartile completion markers for video playback tracking.
pub const QUARTILE_MARKERS: [u8; 4] = [25, 50, 75, 100];

/// Body of `POST /viewability/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewabilityReport {
    /// Measured viewability percentage, `0.0..=100.0`.
    pub viewability: f64,
    /// Reached quartile markers, each one of 25/50/75/100.
    pub quartiles: Vec<u8>,
}

impl ViewabilityReport {
    /// Create a viewability report.
    pub fn new(viewability: f64, quartiles: Vec<u8>) -> Self {
        Self {
            viewability,
            quartiles,
        }
    }

    /// Validate report invariants before any network call.
    pub fn validate(&self) -> AdxResult<()> {
        if !self.viewability.is_finite() || !(0.0..=100.0).contains(&self.viewability) {
            return Err(AdxError::Validation(format!(
                "viewability {} is outside 0-100",
                self.viewability
            )));
        }
        for quartile in &self.quartiles {
            if !QUARTILE_MARKERS.contains(quartile) {
                return Err(AdxError::Validation(format!(
                    "{} is not a quartile marker",
                    quartile
                )));
            }
        }
        Ok(())
    }
}
