//! OpenRTB bid request structures.
//!
//! The tree is rooted at [`BidRequest`]: an id, one or more [`Impression`]s,
//! optional inventory context ([`Site`] or [`App`]), optional [`Device`] and
//! [`User`], auction parameters, and regulatory flags. All entities are
//! value objects: construct, validate once, then treat as read-only.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AdxError, AdxResult};

/// Banner size entry for [`Banner::format`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    /// Width in device-independent pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    /// Height in device-independent pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Banner creative descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Banner {
    /// Exact width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    /// Exact height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wmin: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hmin: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wmax: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hmax: Option<i32>,
    /// Ad position on screen (OpenRTB position codes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<i32>,
    /// Permitted sizes, preferred over `w`/`h` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Vec<Format>>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Video creative descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Supported MIME types, e.g. `video/mp4`. Required by the exchange.
    pub mimes: Vec<String>,
    /// Minimum ad duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minduration: Option<i32>,
    /// Maximum ad duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxduration: Option<i32>,
    /// Supported video protocols (OpenRTB protocol codes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    /// Start delay in seconds (0 = pre-roll, -1 = generic mid-roll).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startdelay: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linearity: Option<i32>,
    /// 1 if the ad can be skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipmin: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipafter: Option<i32>,
    /// Position within a pod, 1-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i32>,
    /// Supported API frameworks (VPAID, OMID, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<Vec<i32>>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

impl Video {
    /// Create a video descriptor with the required MIME type list.
    pub fn new(mimes: Vec<String>) -> Self {
        Self {
            mimes,
            minduration: None,
            maxduration: None,
            protocols: None,
            w: None,
            h: None,
            startdelay: None,
            placement: None,
            linearity: None,
            skip: None,
            skipmin: None,
            skipafter: None,
            sequence: None,
            api: None,
            ext: Map::new(),
        }
    }
}

/// Native creative descriptor. The `request` field carries the opaque
/// Native Ads API request string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Native {
    /// Native Ads API request payload. Required by the exchange.
    pub request: String,
    /// Native Ads API version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<Vec<i32>>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// The creative shape an impression is offering. At most one per impression.
#[derive(Debug, Clone, Copy)]
pub enum Creative<'a> {
    Banner(&'a Banner),
    Video(&'a Video),
    Native(&'a Native),
}

/// One ad slot within a bid request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Impression {
    /// Slot identifier, unique within the request.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native: Option<Native>,
    /// Minimum acceptable bid price in CPM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidfloor: Option<f64>,
    /// Currency of `bidfloor` (ISO 4217).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidfloorcur: Option<String>,
    /// 1 if the creative must be served over HTTPS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<i32>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

impl Impression {
    /// Create an impression with the given slot id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Offer a banner slot. Clears any previously set creative shape.
    pub fn with_banner(mut self, banner: Banner) -> Self {
        self.banner = Some(banner);
        self.video = None;
        self.native = None;
        self
    }

    /// Offer a video slot. Clears any previously set creative shape.
    pub fn with_video(mut self, video: Video) -> Self {
        self.video = Some(video);
        self.banner = None;
        self.native = None;
        self
    }

    /// Offer a native slot. Clears any previously set creative shape.
    pub fn with_native(mut self, native: Native) -> Self {
        self.native = Some(native);
        self.banner = None;
        self.video = None;
        self
    }

    /// Set the bid floor and its currency.
    pub fn with_bid_floor(mut self, floor: f64, currency: impl Into<String>) -> Self {
        self.bidfloor = Some(floor);
        self.bidfloorcur = Some(currency.into());
        self
    }

    /// The creative shape offered by this impression, if any.
    pub fn creative(&self) -> Option<Creative<'_>> {
        if let Some(ref b) = self.banner {
            Some(Creative::Banner(b))
        } else if let Some(ref v) = self.video {
            Some(Creative::Video(v))
        } else {
            self.native.as_ref().map(Creative::Native)
        }
    }

    /// Validate slot invariants: non-empty id, at most one creative shape,
    /// non-negative bid floor.
    pub fn validate(&self) -> AdxResult<()> {
        if self.id.is_empty() {
            return Err(AdxError::Validation(
                "impression id must not be empty".to_string(),
            ));
        }
        let shapes = [
            self.banner.is_some(),
            self.video.is_some(),
            self.native.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count();
        if shapes > 1 {
            return Err(AdxError::Validation(format!(
                "impression {} declares {} creative shapes, at most one of banner/video/native is allowed",
                self.id, shapes
            )));
        }
        if let Some(floor) = self.bidfloor {
            if !floor.is_finite() || floor < 0.0 {
                return Err(AdxError::Validation(format!(
                    "impression {} has invalid bid floor {}",
                    self.id, floor
                )));
            }
        }
        Ok(())
    }
}

/// Publisher of the site or app.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// IAB content categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Content metadata for the site or app hosting the impression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prodq: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contentrating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userrating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qagmediarating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// 1 for live content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub livestream: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourcerelationship: Option<i32>,
    /// Content length in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddable: Option<i32>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Website inventory context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Site {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<Vec<String>>,
    /// URL of the page hosting the impression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Mobile/CTV application inventory context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct App {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Platform bundle or package name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storeurl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Device geolocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Source of the location data (OpenRTB location type codes).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub location_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastfix: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipservice: Option<i32>,
    /// ISO 3166-1 alpha-3 country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regionfips104: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utcoffset: Option<i32>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Device the impression will be delivered to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    /// Browser user agent string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ua: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    /// Do-not-track flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnt: Option<i32>,
    /// Limit-ad-tracking flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lmt: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devicetype: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hwv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppi: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pxratio: Option<f64>,
    /// 1 if JavaScript is supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectiontype: Option<i32>,
    /// Advertising identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub didsha1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub didmd5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpidsha1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpidmd5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macsha1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macmd5: Option<String>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Audience segment within a [`Data`] object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Additional audience data from a named provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Data {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<Vec<Segment>>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// User the impression will be shown to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// Exchange-specific user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Buyer-specific user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyeruid: Option<String>,
    /// Year of birth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yob: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Data>>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// Regulatory flags applying to the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Regs {
    /// 1 if the request is subject to COPPA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coppa: Option<i32>,
    /// 1 if the request is subject to GDPR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr: Option<i32>,
    /// US privacy (CCPA) consent string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub us_privacy: Option<String>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

/// The inventory context a bid request originates from. The wire format
/// carries `site` and `app` as independent optional objects, but they describe
/// mutually exclusive real-world contexts.
#[derive(Debug, Clone, Copy)]
pub enum InventoryContext<'a> {
    Site(&'a Site),
    App(&'a App),
}

/// Top-level OpenRTB bid request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BidRequest {
    /// Request identifier, echoed back in the response's `id`.
    pub id: String,
    /// Ad slots offered, in auction order. Must be non-empty.
    pub imp: Vec<Impression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<App>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Auction type: 1 = first price, 2 = second price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<i32>,
    /// Maximum time budget in milliseconds for bids to arrive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmax: Option<i32>,
    /// Allowed currencies (ISO 4217).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cur: Option<Vec<String>>,
    /// Blocked IAB content categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcat: Option<Vec<String>>,
    /// Blocked advertiser domains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badv: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regs: Option<Regs>,
    /// Unmodeled fields, preserved for round-tripping.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

impl BidRequest {
    /// Create a bid request with the given id and impression list.
    pub fn new(id: impl Into<String>, imp: Vec<Impression>) -> Self {
        Self {
            id: id.into(),
            imp,
            ..Default::default()
        }
    }

    /// Set the website context. Clears any app context.
    pub fn with_site(mut self, site: Site) -> Self {
        self.site = Some(site);
        self.app = None;
        self
    }

    /// Set the application context. Clears any site context.
    pub fn with_app(mut self, app: App) -> Self {
        self.app = Some(app);
        self.site = None;
        self
    }

    /// Set the device descriptor.
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Set the user descriptor.
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Set the auction timeout budget in milliseconds.
    pub fn with_tmax(mut self, tmax: i32) -> Self {
        self.tmax = Some(tmax);
        self
    }

    /// The inventory context of this request, if one is present.
    pub fn context(&self) -> Option<InventoryContext<'_>> {
        if let Some(ref site) = self.site {
            Some(InventoryContext::Site(site))
        } else {
            self.app.as_ref().map(InventoryContext::App)
        }
    }

    /// Parse and validate a bid request from wire JSON.
    pub fn parse(payload: &str) -> AdxResult<Self> {
        let request: Self = serde_json::from_str(payload)?;
        request.validate()?;
        Ok(request)
    }

    /// Validate and serialize this request to wire JSON.
    pub fn to_json(&self) -> AdxResult<String> {
        self.validate()?;
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Validate request invariants: non-empty id, non-empty impression list
    /// with unique slot ids, per-impression invariants, Site XOR App.
    pub fn validate(&self) -> AdxResult<()> {
        if self.id.is_empty() {
            return Err(AdxError::Validation(
                "bid request id must not be empty".to_string(),
            ));
        }
        if self.imp.is_empty() {
            return Err(AdxError::Validation(format!(
                "bid request {} has no impressions",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for imp in &self.imp {
            imp.validate()?;
            if !seen.insert(imp.id.as_str()) {
                return Err(AdxError::Validation(format!(
                    "duplicate impression id {} in bid request {}",
                    imp.id, self.id
                )));
            }
        }
        if self.site.is_some() && self.app.is_some() {
            return Err(AdxError::Validation(format!(
                "bid request {} declares both site and app contexts",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_request() -> BidRequest {
        BidRequest::new(
            "req-1",
            vec![Impression::new("imp-1").with_bid_floor(0.5, "USD")],
        )
    }

    #[test]
    fn test_minimal_request_validates() {
        assert!(minimal_request().validate().is_ok());
    }

    #[test]
    fn test_missing_id_fails_validation() {
        let request = BidRequest::new("", vec![Impression::new("imp-1")]);
        assert!(matches!(
            request.validate(),
            Err(AdxError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_imp_list_fails_validation() {
        let request = BidRequest::new("req-1", vec![]);
        assert!(matches!(
            request.validate(),
            Err(AdxError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_impression_ids_fail_validation() {
        let request = BidRequest::new(
            "req-1",
            vec![Impression::new("imp-1"), Impression::new("imp-1")],
        );
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_parse_rejects_missing_id() {
        let payload = json!({"imp": [{"id": "imp-1"}]}).to_string();
        assert!(matches!(
            BidRequest::parse(&payload),
            Err(AdxError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_imp() {
        let payload = json!({"id": "req-1", "imp": []}).to_string();
        assert!(matches!(
            BidRequest::parse(&payload),
            Err(AdxError::Validation(_))
        ));
    }

    #[test]
    fn test_site_and_app_are_mutually_exclusive() {
        let payload = json!({
            "id": "req-1",
            "imp": [{"id": "imp-1"}],
            "site": {"domain": "news.example.com"},
            "app": {"bundle": "com.example.game"}
        })
        .to_string();
        assert!(BidRequest::parse(&payload).is_err());
    }

    #[test]
    fn test_with_app_clears_site() {
        let request = minimal_request()
            .with_site(Site {
                domain: Some("news.example.com".to_string()),
                ..Default::default()
            })
            .with_app(App {
                bundle: Some("com.example.game".to_string()),
                ..Default::default()
            });
        assert!(request.site.is_none());
        assert!(matches!(
            request.context(),
            Some(InventoryContext::App(_))
        ));
    }

    #[test]
    fn test_impression_creative_exclusivity() {
        let payload = json!({
            "id": "imp-1",
            "banner": {"w": 300, "h": 250},
            "video": {"mimes": ["video/mp4"]}
        })
        .to_string();
        let imp: Impression = serde_json::from_str(&payload).unwrap();
        assert!(imp.validate().is_err());
    }

    #[test]
    fn test_with_video_clears_banner() {
        let imp = Impression::new("imp-1")
            .with_banner(Banner {
                w: Some(300),
                h: Some(250),
                ..Default::default()
            })
            .with_video(Video::new(vec!["video/mp4".to_string()]));
        assert!(imp.banner.is_none());
        assert!(matches!(imp.creative(), Some(Creative::Video(_))));
        assert!(imp.validate().is_ok());
    }

    #[test]
    fn test_negative_bid_floor_fails_validation() {
        let imp = Impression::new("imp-1").with_bid_floor(-0.1, "USD");
        assert!(imp.validate().is_err());
    }

    #[test]
    fn test_round_trip_preserves_unknown_fields() {
        let payload = json!({
            "id": "req-1",
            "imp": [{
                "id": "imp-1",
                "bidfloor": 0.5,
                "bidfloorcur": "USD",
                "pmp": {"private_auction": 1}
            }],
            "ext": {"exchange_hint": "ctv"},
            "wseat": ["seat-9"]
        });
        let request = BidRequest::parse(&payload.to_string()).unwrap();

        // Unknown fields land in the extension slot.
        assert_eq!(request.ext["wseat"], json!(["seat-9"]));
        assert_eq!(request.ext["ext"]["exchange_hint"], json!("ctv"));
        assert_eq!(request.imp[0].ext["pmp"]["private_auction"], json!(1));

        let round_tripped: Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(round_tripped, payload);
    }

    #[test]
    fn test_absent_optionals_stay_absent() {
        let request = minimal_request();
        let value = serde_json::to_value(&request).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("site"));
        assert!(!object.contains_key("device"));
        assert!(!object.contains_key("tmax"));
    }

    #[test]
    fn test_geo_type_wire_name() {
        let geo = Geo {
            lat: Some(40.7),
            location_type: Some(2),
            ..Default::default()
        };
        let value = serde_json::to_value(&geo).unwrap();
        assert_eq!(value["type"], json!(2));
    }
}
