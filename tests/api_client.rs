//! Integration tests for the REST client.
//!
//! Each test spins up a canned-response HTTP listener on a loopback port, so
//! the full request path (URL construction, headers, status classification,
//! response decoding) is exercised without a live exchange.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use adx::api::{AdxClient, AnalyticsParams, VastParams, ViewabilityReport};
use adx::error::AdxError;
use adx::openrtb::{BidRequest, Impression};

const API_KEY: &str = "test-key";

/// Serve exactly one HTTP request with a canned response, returning the base
/// URL and a handle resolving to the raw request text.
async fn serve_once(
    status_line: &'static str,
    content_type: &'static str,
    body: &'static str,
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            content_type,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{}", addr), handle)
}

/// Read one full HTTP request (headers plus Content-Length body).
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = vec![0u8; 65536];
    let mut total = 0;
    loop {
        let n = socket.read(&mut buf[total..]).await.unwrap();
        total += n;
        let text = String::from_utf8_lossy(&buf[..total]).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text
                .lines()
                .find_map(|line| {
                    line.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .and_then(|v| v.trim().parse::<usize>().ok())
                })
                .unwrap_or(0);
            if total >= header_end + 4 + content_length {
                return text;
            }
        }
        if n == 0 {
            return String::from_utf8_lossy(&buf[..total]).to_string();
        }
    }
}

fn sample_bid_request() -> BidRequest {
    BidRequest::new(
        "req-1",
        vec![Impression::new("imp-1").with_bid_floor(0.5, "USD")],
    )
}

#[tokio::test]
async fn bid_request_round_trip() {
    let (base_url, server) = serve_once(
        "200 OK",
        "application/json",
        r#"{"id":"req-1","seatbid":[{"bid":[{"id":"bid-1","impid":"imp-1","price":1.25}]}]}"#,
    )
    .await;

    let client = AdxClient::new(&base_url, API_KEY).unwrap();
    let response = client.bid_request(&sample_bid_request()).await.unwrap();

    assert_eq!(response.id, "req-1");
    let bids: Vec<_> = response.bids().collect();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].price, 1.25);
    assert_eq!(bids[0].impid, "imp-1");

    let request = server.await.unwrap().to_ascii_lowercase();
    assert!(request.starts_with("post /rtb/bid http/1.1"));
    assert!(request.contains("x-api-key: test-key"));
    assert!(request.contains("\"bidfloor\":0.5"));
}

#[tokio::test]
async fn http_401_maps_to_authentication_error() {
    let (base_url, _server) = serve_once("401 Unauthorized", "text/plain", "invalid API key").await;
    let client = AdxClient::new(&base_url, API_KEY).unwrap();

    match client.bid_request(&sample_bid_request()).await {
        Err(AdxError::Authentication(body)) => assert_eq!(body, "invalid API key"),
        other => panic!("expected Authentication error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn http_429_maps_to_rate_limit_error() {
    let (base_url, _server) = serve_once("429 Too Many Requests", "text/plain", "slow down").await;
    let client = AdxClient::new(&base_url, API_KEY).unwrap();

    match client.get_miner_earnings("miner-7").await {
        Err(AdxError::RateLimited(body)) => assert_eq!(body, "slow down"),
        other => panic!("expected RateLimited error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn http_400_maps_to_validation_error() {
    let (base_url, _server) = serve_once("400 Bad Request", "text/plain", "missing imp").await;
    let client = AdxClient::new(&base_url, API_KEY).unwrap();

    match client.bid_request(&sample_bid_request()).await {
        Err(AdxError::Validation(body)) => assert_eq!(body, "missing imp"),
        other => panic!("expected Validation error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn http_500_maps_to_network_error() {
    let (base_url, _server) =
        serve_once("500 Internal Server Error", "text/plain", "exchange down").await;
    let client = AdxClient::new(&base_url, API_KEY).unwrap();

    match client.bid_request(&sample_bid_request()).await {
        Err(AdxError::Network { status, message }) => {
            assert_eq!(status, Some(500));
            assert_eq!(message, "exchange down");
        }
        other => panic!("expected Network error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn timeout_is_distinct_from_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and stall: never answer.
    let _server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut socket).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let client = AdxClient::builder(format!("http://{}", addr), API_KEY)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    match client.bid_request(&sample_bid_request()).await {
        Err(AdxError::Timeout) => {}
        other => panic!("expected Timeout, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn get_vast_returns_raw_xml() {
    let (base_url, server) = serve_once(
        "200 OK",
        "application/xml",
        r#"<VAST version="4.0"><Ad id="a1"/></VAST>"#,
    )
    .await;
    let client = AdxClient::new(&base_url, API_KEY).unwrap();

    let params = VastParams::new(1920, 1080, 30).with_extra("pod", "pre");
    let xml = client.get_vast(&params).await.unwrap();
    assert!(xml.starts_with("<VAST"));

    let request = server.await.unwrap();
    assert!(request.contains("GET /vast?w=1920&h=1080&dur=30&pod=pre HTTP/1.1"));
}

#[tokio::test]
async fn get_analytics_builds_time_range_query() {
    let (base_url, server) = serve_once(
        "200 OK",
        "application/json",
        r#"{"publisherId":"pub-1","totalImpressions":10,"totalRevenue":"1.50","fillRate":0.5,"ecpm":"0.15","timeRange":{"start":"2026-07-01T00:00:00+00:00","end":"2026-07-02T00:00:00+00:00"},"dailyStats":[]}"#,
    )
    .await;
    let client = AdxClient::new(&base_url, API_KEY).unwrap();

    let start = chrono::DateTime::parse_from_rfc3339("2026-07-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let end = chrono::DateTime::parse_from_rfc3339("2026-07-02T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let analytics = client
        .get_analytics(&AnalyticsParams::new("pub-1", start, end))
        .await
        .unwrap();

    assert_eq!(analytics.publisher_id, "pub-1");
    assert_eq!(analytics.total_revenue.to_string(), "1.50");

    let request = server.await.unwrap();
    assert!(request.contains("GET /analytics?publisher_id=pub-1&start=2026-07-01T00%3A00%3A00%2B00%3A00&end=2026-07-02T00%3A00%3A00%2B00%3A00"));
}

#[tokio::test]
async fn update_miner_status_puts_status_body() {
    let (base_url, server) = serve_once("200 OK", "application/json", "{}").await;
    let client = AdxClient::new(&base_url, API_KEY).unwrap();

    client
        .update_miner_status("miner-7", adx::api::MinerStatus::Maintenance)
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.contains("PUT /miner/miner-7/status HTTP/1.1"));
    assert!(request.contains(r#"{"status":"maintenance"}"#));
}

#[tokio::test]
async fn report_viewability_posts_quartiles() {
    let (base_url, server) = serve_once("204 No Content", "text/plain", "").await;
    let client = AdxClient::new(&base_url, API_KEY).unwrap();

    client
        .report_viewability("imp-9", &ViewabilityReport::new(92.5, vec![25, 50, 75, 100]))
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.contains("POST /viewability/imp-9 HTTP/1.1"));
    assert!(request.contains(r#""quartiles":[25,50,75,100]"#));
}

#[tokio::test]
async fn malformed_response_body_is_a_validation_error() {
    let (base_url, _server) = serve_once("200 OK", "application/json", "{\"id\":").await;
    let client = AdxClient::new(&base_url, API_KEY).unwrap();

    assert!(matches!(
        client.bid_request(&sample_bid_request()).await,
        Err(AdxError::Validation(_))
    ));
}
