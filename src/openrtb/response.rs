//! OpenRTB bid response structures.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AdxError, AdxResult};

/// A single bid on one impression.
///
/// Rendering is either inline (`adm` markup) or by win-notice fetch (`nurl`);
/// the exchange populates one of the two.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bid {
    /// Bidder-assigned bid identifier.
    pub id: String,
    /// Id of the [`Impression`](crate::openrtb::Impression) this bid is for.
    pub impid: String,
    /// Bid price in CPM. Currency is implied by the parent response's `cur`.
    pub price: f64,
    /// Win notice URL, also the creative source when `adm` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nurl: Option<String>,
    /// Billing notice URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burl: Option<String>,
    /// Loss notice URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lurl: Option<String>,
    /// Inline ad markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adid: Option<String>,
    /// Advertiser domains for block-list checking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adomain: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    /// Campaign image URL for quality review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iurl: Option<String>,
    /// Campaign id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    /// Creative id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<Vec<String>>,
    /// Creative attribute codes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qagmediarating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Deal id when the bid pertains to a private marketplace deal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dealid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wratio: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hratio: Option<i32>,
    /// Advisory seconds the bid may be cached before use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i32>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

impl Bid {
    /// Validate bid invariants: non-empty ids, finite non-negative price.
    pub fn validate(&self) -> AdxResult<()> {
        if self.id.is_empty() {
            return Err(AdxError::Validation("bid id must not be empty".to_string()));
        }
        if self.impid.is_empty() {
            return Err(AdxError::Validation(format!(
                "bid {} references no impression",
                self.id
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AdxError::Validation(format!(
                "bid {} has invalid price {}",
                self.id, self.price
            )));
        }
        Ok(())
    }
}

/// Bids attributed to one bidding seat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeatBid {
    /// Bids in the order the seat submitted them.
    pub bid: Vec<Bid>,
    /// Seat (buyer) identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    /// 1 if the bids must be won or lost as a group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<i32>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// No-bid reason codes (OpenRTB §5.24 subset used by this exchange).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoBidReason {
    UnknownError,
    TechnicalError,
    InvalidRequest,
    KnownWebSpider,
    SuspectedNonHuman,
    CloudIp,
    UnsupportedDevice,
    BlockedPublisher,
    UnmatchedUser,
}

impl NoBidReason {
    /// Decode a wire `nbr` code. Unknown codes return `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::UnknownError),
            1 => Some(Self::TechnicalError),
            2 => Some(Self::InvalidRequest),
            3 => Some(Self::KnownWebSpider),
            4 => Some(Self::SuspectedNonHuman),
            5 => Some(Self::CloudIp),
            6 => Some(Self::UnsupportedDevice),
            7 => Some(Self::BlockedPublisher),
            8 => Some(Self::UnmatchedUser),
            _ => None,
        }
    }
}

/// Top-level OpenRTB bid response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BidResponse {
    /// Echo of the originating request's id. The SDK does not enforce the
    /// match; callers should treat a mismatch as a protocol error.
    pub id: String,
    /// Seat bids; absent or empty on a no-bid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seatbid: Option<Vec<SeatBid>>,
    /// Bidder-generated response id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidid: Option<String>,
    /// Currency of all bid prices (ISO 4217).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cur: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<String>,
    /// No-bid reason code, populated when the response carries no bids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbr: Option<i32>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

impl BidResponse {
    /// Parse and validate a bid response from wire JSON.
    pub fn parse(payload: &str) -> AdxResult<Self> {
        let response: Self = serde_json::from_str(payload)?;
        response.validate()?;
        Ok(response)
    }

    /// Validate and serialize this response to wire JSON.
    pub fn to_json(&self) -> AdxResult<String> {
        self.validate()?;
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Validate response invariants.
    pub fn validate(&self) -> AdxResult<()> {
        if self.id.is_empty() {
            return Err(AdxError::Validation(
                "bid response id must not be empty".to_string(),
            ));
        }
        for seatbid in self.seatbid.iter().flatten() {
            if seatbid.bid.is_empty() {
                return Err(AdxError::Validation(format!(
                    "seat {} carries no bids",
                    seatbid.seat.as_deref().unwrap_or("(unnamed)")
                )));
            }
            for bid in &seatbid.bid {
                bid.validate()?;
            }
        }
        Ok(())
    }

    /// Iterate over all bids across all seats, in seat then bid order.
    pub fn bids(&self) -> impl Iterator<Item = &Bid> {
        self.seatbid.iter().flatten().flat_map(|s| s.bid.iter())
    }

    /// Whether the response carries no bids at all.
    pub fn is_no_bid(&self) -> bool {
        self.bids().next().is_none()
    }

    /// Decoded no-bid reason, when the exchange supplied one.
    pub fn no_bid_reason(&self) -> Option<NoBidReason> {
        self.nbr.and_then(NoBidReason::from_code)
    }
}
