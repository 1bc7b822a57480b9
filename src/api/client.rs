//! ADX REST API client implementation.
//!
//! Every operation validates its input locally, issues exactly one HTTP call
//! with the configured timeout, validates the response, and returns a typed
//! result or a classified [`AdxError`]. The client holds no per-request
//! mutable state beyond reqwest's connection pool, so a single instance (or
//! cheap clones of it) can serve concurrent callers.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::api::types::*;
use crate::error::{AdxError, AdxResult};
use crate::openrtb::{BidRequest, BidResponse};

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Builder for configuring [`AdxClient`].
#[derive(Debug, Clone)]
pub struct AdxClientBuilder {
    base_url: String,
    api_key: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
}

impl AdxClientBuilder {
    /// Create a new builder with the given base URL and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: Vec::new(),
        }
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Add a default header to all requests.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Build the client.
    pub fn build(self) -> AdxResult<AdxClient> {
        if self.api_key.is_empty() {
            return Err(AdxError::Validation("API key must not be empty".to_string()));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "luxfi-adx-rust/",
                env!("CARGO_PKG_VERSION")
            )),
        );
        let api_key_value = reqwest::header::HeaderValue::from_str(&self.api_key)
            .map_err(|e| AdxError::Validation(format!("invalid API key: {}", e)))?;
        headers.insert("X-API-Key", api_key_value);

        for (name, value) in self.default_headers {
            let header_name = reqwest::header::HeaderName::try_from(name.as_str())
                .map_err(|e| AdxError::Validation(format!("invalid header name '{}': {}", name, e)))?;
            let header_value = reqwest::header::HeaderValue::from_str(&value)
                .map_err(|e| AdxError::Validation(format!("invalid header value for '{}': {}", name, e)))?;
            headers.insert(header_name, header_value);
        }

        let http_client = Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(10)
            .default_headers(headers)
            .build()?;

        Ok(AdxClient {
            http_client,
            base_url: self.base_url,
            api_key: self.api_key,
        })
    }
}

/// ADX REST API client.
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct AdxClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl AdxClient {
    /// Create a new client with default settings (10 s timeout, pooling).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> AdxResult<Self> {
        AdxClientBuilder::new(base_url, api_key).build()
    }

    /// Create a new client builder for custom configuration.
    pub fn builder(base_url: impl Into<String>, api_key: impl Into<String>) -> AdxClientBuilder {
        AdxClientBuilder::new(base_url, api_key)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Map a non-success status and its body text onto the error taxonomy.
    fn map_status_error(status: StatusCode, body: String) -> AdxError {
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            body
        };
        match status {
            StatusCode::UNAUTHORIZED => AdxError::Authentication(message),
            StatusCode::TOO_MANY_REQUESTS => AdxError::RateLimited(message),
            StatusCode::BAD_REQUEST => AdxError::Validation(message),
            _ => AdxError::Network {
                status: Some(status.as_u16()),
                message,
            },
        }
    }

    /// Pass a successful response through, or classify the failure.
    async fn expect_success(response: reqwest::Response) -> AdxResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|e| {
            tracing::warn!("failed to read error response body: {}", e);
            String::new()
        });
        Err(Self::map_status_error(status, body))
    }

    /// Decode a successful JSON response body.
    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> AdxResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| AdxError::Validation(format!("failed to decode response: {}", e)))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> AdxResult<T> {
        let response = self.http_client.get(url).send().await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    async fn get_text(&self, url: &str) -> AdxResult<String> {
        let response = self.http_client.get(url).send().await?;
        let response = Self::expect_success(response).await?;
        response
            .text()
            .await
            .map_err(|e| AdxError::network(format!("failed to read response body: {}", e)))
    }

    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> AdxResult<T> {
        let response = self.http_client.post(url).json(body).send().await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// POST with no typed response body beyond success/failure.
    async fn post_ack<B: serde::Serialize>(&self, url: &str, body: &B) -> AdxResult<()> {
        let response = self.http_client.post(url).json(body).send().await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    /// PUT with no typed response body beyond success/failure.
    async fn put_ack<B: serde::Serialize>(&self, url: &str, body: &B) -> AdxResult<()> {
        let response = self.http_client.put(url).json(body).send().await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    // =========================================================================
    // Bidding
    // =========================================================================

    /// Submit an OpenRTB bid request to `POST /rtb/bid`.
    ///
    /// The request is validated locally before any network I/O. The returned
    /// response is schema-validated; the SDK does not verify that its `id`
    /// echoes the request id, and callers should treat a mismatch as a
    /// protocol error.
    pub async fn bid_request(&self, request: &BidRequest) -> AdxResult<BidResponse> {
        request.validate()?;
        let url = format!("{}/rtb/bid", self.base_url);
        let response: BidResponse = self.post(&url, request).await?;
        response.validate()?;
        Ok(response)
    }

    // =========================================================================
    // Creative retrieval
    // =========================================================================

    /// Fetch VAST creative markup from `GET /vast`.
    ///
    /// Returns the raw VAST XML document.
    pub async fn get_vast(&self, params: &VastParams) -> AdxResult<String> {
        let mut url = format!(
            "{}/vast?w={}&h={}&dur={}",
            self.base_url, params.width, params.height, params.duration
        );
        for (key, value) in &params.extra {
            url.push_str(&format!(
                "&{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }
        self.get_text(&url).await
    }

    /// Request an assembled CTV ad pod from `POST /ctv/pod`.
    pub async fn get_ad_pod(&self, request: &AdPodRequest) -> AdxResult<AdPodResponse> {
        request.validate()?;
        let url = format!("{}/ctv/pod", self.base_url);
        self.post(&url, request).await
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Fetch publisher analytics from `GET /analytics`.
    ///
    /// The time range is forwarded as RFC 3339 `start`/`end` query
    /// parameters; interval semantics are the caller's (half-open
    /// recommended).
    pub async fn get_analytics(&self, params: &AnalyticsParams) -> AdxResult<AnalyticsResponse> {
        if params.publisher_id.is_empty() {
            return Err(AdxError::Validation(
                "publisher id must not be empty".to_string(),
            ));
        }
        let url = format!(
            "{}/analytics?publisher_id={}&start={}&end={}",
            self.base_url,
            urlencoding::encode(&params.publisher_id),
            urlencoding::encode(&params.start.to_rfc3339()),
            urlencoding::encode(&params.end.to_rfc3339())
        );
        self.get(&url).await
    }

    // =========================================================================
    // Miner lifecycle
    // =========================================================================

    /// Register a home miner via `POST /miner/register`.
    pub async fn register_miner(&self, config: &MinerConfig) -> AdxResult<MinerRegistration> {
        config.validate()?;
        let url = format!("{}/miner/register", self.base_url);
        self.post(&url, config).await
    }

    /// Fetch miner earnings from `GET /miner/{id}/earnings`.
    pub async fn get_miner_earnings(&self, miner_id: &str) -> AdxResult<MinerEarnings> {
        if miner_id.is_empty() {
            return Err(AdxError::Validation("miner id must not be empty".to_string()));
        }
        let url = format!(
            "{}/miner/{}/earnings",
            self.base_url,
            urlencoding::encode(miner_id)
        );
        self.get(&url).await
    }

    /// Update a miner's status via `PUT /miner/{id}/status`.
    pub async fn update_miner_status(&self, miner_id: &str, status: MinerStatus) -> AdxResult<()> {
        if miner_id.is_empty() {
            return Err(AdxError::Validation("miner id must not be empty".to_string()));
        }
        let url = format!(
            "{}/miner/{}/status",
            self.base_url,
            urlencoding::encode(miner_id)
        );
        self.put_ack(&url, &MinerStatusUpdate { status }).await
    }

    // =========================================================================
    // Delivery reporting
    // =========================================================================

    /// Report impression delivery via `POST /impression/{id}`.
    ///
    /// Fire-and-acknowledge: success or a classified error, no response body.
    pub async fn report_impression(&self, impression_id: &str, data: &Value) -> AdxResult<()> {
        if impression_id.is_empty() {
            return Err(AdxError::Validation(
                "impression id must not be empty".to_string(),
            ));
        }
        let url = format!(
            "{}/impression/{}",
            self.base_url,
            urlencoding::encode(impression_id)
        );
        self.post_ack(&url, data).await
    }

    /// Report viewability metrics via `POST /viewability/{id}`.
    pub async fn report_viewability(
        &self,
        impression_id: &str,
        report: &ViewabilityReport,
    ) -> AdxResult<()> {
        if impression_id.is_empty() {
            return Err(AdxError::Validation(
                "impression id must not be empty".to_string(),
            ));
        }
        report.validate()?;
        let url = format!(
            "{}/viewability/{}",
            self.base_url,
            urlencoding::encode(impression_id)
        );
        self.post_ack(&url, report).await
    }

    // =========================================================================
    // Event stream
    // =========================================================================

    /// Create an event stream client for this exchange.
    ///
    /// The stream URL is derived from the base URL by swapping the scheme
    /// (`http` → `ws`) and appending `/ws`; the API key is carried on the
    /// handshake. The stream is not connected until
    /// [`connect()`](crate::websocket::AdxEventStream::connect) is called.
    #[cfg(feature = "ws")]
    pub fn event_stream(&self) -> crate::websocket::AdxEventStream {
        crate::websocket::AdxEventStream::new(
            crate::network::ws_url(&self.base_url),
            self.api_key.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openrtb::Impression;

    #[test]
    fn test_client_creation() {
        let client = AdxClient::new("https://api.adx.example", "key-1").unwrap();
        assert_eq!(client.base_url(), "https://api.adx.example");
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = AdxClient::builder("https://api.adx.example/", "key-1")
            .timeout_secs(3)
            .header("X-Trace-Id", "t-1")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://api.adx.example");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(
            AdxClient::new("https://api.adx.example", ""),
            Err(AdxError::Validation(_))
        ));
    }

    #[test]
    fn test_status_error_mapping() {
        let err = AdxClient::map_status_error(StatusCode::UNAUTHORIZED, "bad key".to_string());
        assert!(matches!(err, AdxError::Authentication(_)));

        let err = AdxClient::map_status_error(StatusCode::TOO_MANY_REQUESTS, String::new());
        assert!(matches!(err, AdxError::RateLimited(_)));

        let err = AdxClient::map_status_error(StatusCode::BAD_REQUEST, "no imp".to_string());
        assert!(matches!(err, AdxError::Validation(_)));

        let err = AdxClient::map_status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
        assert!(matches!(
            err,
            AdxError::Network {
                status: Some(500),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_bid_request_fails_before_network() {
        // Unroutable base URL: if validation did not run first, this would
        // surface as a network error instead.
        let client = AdxClient::new("http://192.0.2.1:9", "key-1").unwrap();
        let request = BidRequest::new("req-1", vec![]);
        assert!(matches!(
            client.bid_request(&request).await,
            Err(AdxError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_viewability_fails_before_network() {
        let client = AdxClient::new("http://192.0.2.1:9", "key-1").unwrap();
        let report = ViewabilityReport::new(250.0, vec![25]);
        assert!(matches!(
            client.report_viewability("imp-1", &report).await,
            Err(AdxError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_miner_id_rejected_locally() {
        let client = AdxClient::new("http://192.0.2.1:9", "key-1").unwrap();
        assert!(matches!(
            client.get_miner_earnings("").await,
            Err(AdxError::Validation(_))
        ));
    }

    #[test]
    fn test_valid_request_builds() {
        let request = BidRequest::new(
            "req-1",
            vec![Impression::new("imp-1").with_bid_floor(0.5, "USD")],
        );
        assert!(request.validate().is_ok());
    }
}
