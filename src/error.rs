//! Error taxonomy for the ADX SDK.
//!
//! Every fallible SDK operation returns [`AdxResult`]. The variants mirror the
//! exchange's failure classes: authentication, rate limiting, validation (local
//! or HTTP 400), timeouts, other network failures, and event-stream state
//! errors. Where a server response is available its status and body text are
//! preserved for debugging.

use thiserror::Error;

/// Unified error type for all ADX SDK operations.
#[derive(Debug, Error)]
pub enum AdxError {
    /// API key rejected by the exchange (HTTP 401).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Schema validation failure: locally before any network call, or an
    /// HTTP 400 from the exchange.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request deadline expired. Distinct from [`AdxError::Network`] so
    /// callers can apply their own retry policy without misclassifying a slow
    /// server as a hard failure.
    #[error("request timed out")]
    Timeout,

    /// Connection failure or an unclassified non-2xx status.
    #[error("network error: {message}")]
    Network {
        /// HTTP status, when the failure came from a response.
        status: Option<u16>,
        /// Failure description, including the response body where available.
        message: String,
    },

    /// Operation requires an open event stream and none exists.
    #[error("event stream is not connected")]
    NotConnected,

    /// Operation on an event stream that was explicitly closed.
    #[error("event stream is closed")]
    StreamClosed,
}

impl AdxError {
    /// Build a [`AdxError::Network`] without an HTTP status.
    pub fn network(message: impl Into<String>) -> Self {
        AdxError::Network {
            status: None,
            message: message.into(),
        }
    }
}

/// Result type alias for SDK operations.
pub type AdxResult<T> = Result<T, AdxError>;

impl From<serde_json::Error> for AdxError {
    fn from(err: serde_json::Error) -> Self {
        AdxError::Validation(format!("invalid payload: {}", err))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AdxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdxError::Timeout
        } else {
            AdxError::Network {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(feature = "ws")]
impl From<tokio_tungstenite::tungstenite::Error> for AdxError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;
        match err {
            Error::ConnectionClosed | Error::AlreadyClosed => AdxError::NotConnected,
            Error::Io(e) => AdxError::network(e.to_string()),
            Error::Url(e) => AdxError::Validation(format!("invalid websocket url: {}", e)),
            Error::Http(resp) => AdxError::Network {
                status: Some(resp.status().as_u16()),
                message: format!("websocket handshake rejected: HTTP {}", resp.status()),
            },
            other => AdxError::network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_helper() {
        let err = AdxError::network("connection refused");
        match err {
            AdxError::Network { status, ref message } => {
                assert_eq!(status, None);
                assert_eq!(message, "connection refused");
            }
            _ => panic!("expected Network variant"),
        }
    }

    #[test]
    fn test_serde_error_maps_to_validation() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = AdxError::from(parse_err);
        assert!(matches!(err, AdxError::Validation(_)));
    }

    #[test]
    fn test_display_carries_body_text() {
        let err = AdxError::Authentication("invalid API key".to_string());
        assert_eq!(err.to_string(), "authentication failed: invalid API key");
    }
}
