//! Network URL constants and derivation helpers for the ADX SDK.

/// Default REST API base URL for the ADX exchange.
pub const DEFAULT_API_URL: &str = "https://api.adx.luxfi.network";

/// Path of the event-stream endpoint, relative to the API base URL.
pub const WS_PATH: &str = "/ws";

/// Derive the event-stream URL from an HTTP base URL.
///
/// Swaps the scheme (`http` → `ws`, `https` → `wss`) and appends [`WS_PATH`].
/// A base URL that already carries a `ws`/`wss` scheme is left as is apart
/// from the path.
pub fn ws_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let swapped = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}{}", swapped, WS_PATH)
}
