//! Publisher analytics types.
//!
//! The analytics wire format uses camelCase field names (`publisherId`,
//! `fillRate`, ...); the serde rename table below is the authoritative
//! mapping and is pinned by tests. Ledger amounts (revenue, eCPM) travel as
//! decimal strings and are parsed into [`Decimal`] rather than `f64`, so
//! reported money survives arithmetic without rounding drift. Ratio fields
//! such as the fill rate stay floating point.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query parameters for `GET /analytics`.
///
/// The exchange treats the range as the caller constructed it; use a
/// half-open interval (start inclusive, end exclusive) to avoid
/// double-counting boundary events between adjacent queries.
#[derive(Debug, Clone)]
pub struct AnalyticsParams {
    /// Publisher to report on.
    pub publisher_id: String,
    /// Range start, sent as RFC 3339.
    pub start: DateTime<Utc>,
    /// Range end, sent as RFC 3339.
    pub end: DateTime<Utc>,
}

impl AnalyticsParams {
    /// Create analytics params for a publisher and time range.
    pub fn new(publisher_id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            publisher_id: publisher_id.into(),
            start,
            end,
        }
    }
}

/// Reported time range, echoed by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Per-day aggregate counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub impressions: u64,
    /// Revenue for the day, decimal string on the wire.
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
    /// Fraction of requests filled, in `[0, 1]`.
    pub fill_rate: f64,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Response for `GET /analytics`.
///
/// `daily_stats` keeps the chronological order the server returned; the
/// client does not re-sort.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub publisher_id: String,
    pub total_impressions: u64,
    /// Total revenue over the range, decimal string on the wire.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_revenue: Decimal,
    /// Fraction of requests filled, in `[0, 1]`.
    pub fill_rate: f64,
    /// Effective CPM, decimal string on the wire.
    #[serde(with = "rust_decimal::serde::str")]
    pub ecpm: Decimal,
    pub time_range: TimeRange,
    pub daily_stats: Vec<DailyStat>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}
