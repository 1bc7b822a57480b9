//! Event stream client for the ADX exchange.
//!
//! [`AdxEventStream`] owns exactly one logical WebSocket connection. The
//! socket lives on a spawned connection task; the caller side talks to it
//! through a command channel, and all state transitions, dispatch, and
//! resubscription happen on that one task. Handler delivery is sequential in
//! registration order: a slow handler delays subsequent messages but can
//! never tear down the stream, and a panicking one is caught and logged.
//!
//! On an unexpected close the task retries indefinitely using capped
//! exponential backoff with jitter (the first attempt waits the configured
//! base delay), replaying the retained subscription set after each
//! successful redial.
//! Transient disconnects are never surfaced to the caller as errors; only
//! [`close`](AdxEventStream::close) ends the stream.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{AdxError, AdxResult};
use crate::websocket::handlers::{dispatch, EventHandler, HandlerId, HandlerRegistry};
use crate::websocket::subscriptions::SubscriptionSet;
use crate::websocket::types::{EventEnvelope, SubscribeMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handshake timeout for dialing the stream endpoint.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// How long `close()` waits for the connection task before aborting it.
const CLOSE_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Event stream configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Delay before the first reconnect attempt.
    pub reconnect_delay: Duration,
    /// Cap for the exponential reconnect backoff.
    pub max_reconnect_delay: Duration,
    /// Whether to replay retained subscriptions after a reconnect.
    pub auto_resubscribe: bool,
    /// Capacity of the caller → task command channel.
    pub command_channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_delay: Duration::from_secs(60),
            auto_resubscribe: true,
            command_channel_capacity: 100,
        }
    }
}

/// Connection state of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Terminal; reached only by explicit [`AdxEventStream::close`].
    Closed,
}

/// Caller → connection task commands.
enum StreamCommand {
    Send(String),
    Close,
}

/// Event stream client.
///
/// All state is instance-scoped; independent streams can coexist in one
/// process.
pub struct AdxEventStream {
    url: String,
    api_key: String,
    config: StreamConfig,
    state: Arc<RwLock<ConnectionState>>,
    handlers: Arc<RwLock<HandlerRegistry>>,
    subscriptions: Arc<RwLock<SubscriptionSet>>,
    cmd_tx: Option<mpsc::Sender<StreamCommand>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl AdxEventStream {
    /// Create a stream client for the given URL and API key. Does not
    /// connect; call [`connect`](Self::connect).
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_config(url, api_key, StreamConfig::default())
    }

    /// Create a stream client with custom configuration.
    pub fn with_config(
        url: impl Into<String>,
        api_key: impl Into<String>,
        config: StreamConfig,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            handlers: Arc::new(RwLock::new(HandlerRegistry::new())),
            subscriptions: Arc::new(RwLock::new(SubscriptionSet::new())),
            cmd_tx: None,
            task: None,
        }
    }

    /// Open the stream connection and start the read loop.
    ///
    /// No-op if already connecting or connected. Errors with
    /// [`AdxError::StreamClosed`] after [`close`](Self::close).
    pub async fn connect(&mut self) -> AdxResult<()> {
        match *self.state.read().await {
            ConnectionState::Closed => return Err(AdxError::StreamClosed),
            ConnectionState::Connecting
            | ConnectionState::Connected
            | ConnectionState::Reconnecting => return Ok(()),
            ConnectionState::Disconnected => {}
        }

        *self.state.write().await = ConnectionState::Connecting;
        let ws = match dial(&self.url, &self.api_key).await {
            Ok(ws) => ws,
            Err(e) => {
                *self.state.write().await = ConnectionState::Disconnected;
                return Err(e);
            }
        };
        *self.state.write().await = ConnectionState::Connected;

        let (cmd_tx, cmd_rx) = mpsc::channel(self.config.command_channel_capacity);
        self.cmd_tx = Some(cmd_tx);

        let ctx = StreamContext {
            url: self.url.clone(),
            api_key: self.api_key.clone(),
            config: self.config.clone(),
            state: self.state.clone(),
            handlers: self.handlers.clone(),
            subscriptions: self.subscriptions.clone(),
        };
        self.task = Some(tokio::spawn(connection_task(ws, cmd_rx, ctx)));

        tracing::info!(url = %self.url, "event stream connected");
        Ok(())
    }

    /// Subscribe to event names.
    ///
    /// Sends one subscribe control message and retains the names so they are
    /// replayed automatically after a reconnect. Fails with
    /// [`AdxError::NotConnected`] if no connection is open.
    pub async fn subscribe(&self, events: Vec<String>) -> AdxResult<()> {
        match *self.state.read().await {
            ConnectionState::Closed => return Err(AdxError::StreamClosed),
            ConnectionState::Connected => {}
            _ => return Err(AdxError::NotConnected),
        }

        self.subscriptions.write().await.add(events.iter().cloned());

        let json = serde_json::to_string(&SubscribeMessage::new(events))?;
        let tx = self.cmd_tx.as_ref().ok_or(AdxError::NotConnected)?;
        tx.send(StreamCommand::Send(json))
            .await
            .map_err(|_| AdxError::NotConnected)
    }

    /// Register a handler for an event name. Handlers for the same event run
    /// in registration order.
    pub async fn on<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.handlers.write().await.add(event, Arc::new(handler) as EventHandler)
    }

    /// Remove a previously registered handler. Removing one that is not
    /// present is a no-op.
    pub async fn off(&self, event: &str, id: HandlerId) {
        self.handlers.write().await.remove(event, id);
    }

    /// Close the stream permanently.
    ///
    /// Idempotent, and safe to call before [`connect`](Self::connect).
    /// Cancels any pending reconnect wait, closes the socket, and joins the
    /// connection task with a bounded timeout before aborting it.
    pub async fn close(&mut self) {
        *self.state.write().await = ConnectionState::Closed;

        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(StreamCommand::Close).await;
        }
        if let Some(mut handle) = self.task.take() {
            if tokio::time::timeout(CLOSE_JOIN_TIMEOUT, &mut handle).await.is_err() {
                tracing::warn!(
                    "event stream task did not stop within {:?}, aborting",
                    CLOSE_JOIN_TIMEOUT
                );
                handle.abort();
            }
        }
        tracing::info!("event stream closed");
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Whether the stream is currently connected.
    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    /// Retained subscription set, sorted.
    pub async fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.read().await.events()
    }

    /// The stream URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The stream configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

/// Shared context for the connection task.
struct StreamContext {
    url: String,
    api_key: String,
    config: StreamConfig,
    state: Arc<RwLock<ConnectionState>>,
    handlers: Arc<RwLock<HandlerRegistry>>,
    subscriptions: Arc<RwLock<SubscriptionSet>>,
}

/// Dial the stream endpoint with the API key on the handshake.
async fn dial(url: &str, api_key: &str) -> AdxResult<WsStream> {
    let mut request = url
        .into_client_request()
        .map_err(|e| AdxError::Validation(format!("invalid websocket url: {}", e)))?;
    request.headers_mut().insert(
        "X-API-Key",
        api_key
            .parse()
            .map_err(|_| AdxError::Validation("API key is not a valid header value".to_string()))?,
    );

    let (stream, _) = tokio::time::timeout(CONNECTION_TIMEOUT, connect_async(request))
        .await
        .map_err(|_| AdxError::Timeout)?
        .map_err(AdxError::from)?;
    Ok(stream)
}

/// Read loop owning the socket. Runs until the caller closes the stream or
/// is dropped.
async fn connection_task(
    mut ws: WsStream,
    mut cmd_rx: mpsc::Receiver<StreamCommand>,
    ctx: StreamContext,
) {
    loop {
        tokio::select! {
            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_frame(&ctx, text.as_str()).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = ws.send(Message::Pong(data)).await {
                            tracing::warn!("failed to send pong: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| format!("code {}: {}", f.code, f.reason))
                            .unwrap_or_else(|| "no close frame".to_string());
                        tracing::info!("event stream closed by server: {}", reason);
                        match reconnect_loop(&ctx, &mut cmd_rx).await {
                            Some(new_ws) => ws = new_ws,
                            None => return,
                        }
                    }
                    Some(Ok(_)) => {
                        // Binary, pong, and raw frames are not part of the protocol.
                    }
                    Some(Err(e)) => {
                        tracing::warn!("event stream error: {}", e);
                        match reconnect_loop(&ctx, &mut cmd_rx).await {
                            Some(new_ws) => ws = new_ws,
                            None => return,
                        }
                    }
                    None => {
                        tracing::info!("event stream ended");
                        match reconnect_loop(&ctx, &mut cmd_rx).await {
                            Some(new_ws) => ws = new_ws,
                            None => return,
                        }
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(StreamCommand::Send(text)) => {
                        if let Err(e) = ws.send(Message::Text(text.into())).await {
                            tracing::warn!("failed to send message: {}", e);
                        }
                    }
                    Some(StreamCommand::Close) | None => {
                        let _ = ws.send(Message::Close(Some(CloseFrame {
                            code: tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode::Normal,
                            reason: "client close".into(),
                        }))).await;
                        *ctx.state.write().await = ConnectionState::Closed;
                        return;
                    }
                }
            }
        }
    }
}

/// Parse and dispatch one inbound frame. Malformed frames are dropped and
/// logged, never fatal.
async fn dispatch_frame(ctx: &StreamContext, text: &str) {
    let envelope: EventEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!("dropping malformed event frame: {}", e);
            return;
        }
    };
    // Snapshot under the lock, dispatch outside it, so handlers may call
    // on()/off() without deadlocking.
    let handlers = ctx.handlers.read().await.snapshot(&envelope.event_type);
    dispatch(&envelope.event_type, &envelope.data, &handlers);
}

/// Redial until it succeeds or the stream is closed. Returns the fresh
/// socket with subscriptions already replayed, or `None` once closed.
async fn reconnect_loop(
    ctx: &StreamContext,
    cmd_rx: &mut mpsc::Receiver<StreamCommand>,
) -> Option<WsStream> {
    if *ctx.state.read().await == ConnectionState::Closed {
        return None;
    }
    *ctx.state.write().await = ConnectionState::Reconnecting;

    let mut attempt = 0u32;
    loop {
        let delay = backoff_delay(&ctx.config, attempt);
        tracing::info!(
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "reconnecting event stream"
        );

        // Race the wait against the command channel so close() interrupts
        // a pending reconnect promptly.
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(StreamCommand::Close) | None => {
                        *ctx.state.write().await = ConnectionState::Closed;
                        return None;
                    }
                    Some(StreamCommand::Send(_)) => {
                        tracing::debug!("dropping outbound message while reconnecting");
                        continue;
                    }
                }
            }
        }

        match dial(&ctx.url, &ctx.api_key).await {
            Ok(mut ws) => {
                if *ctx.state.read().await == ConnectionState::Closed {
                    return None;
                }
                if ctx.config.auto_resubscribe {
                    let events = ctx.subscriptions.read().await.events();
                    if !events.is_empty() {
                        let json = match serde_json::to_string(&SubscribeMessage::new(events)) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!("failed to encode resubscribe message: {}", e);
                                String::new()
                            }
                        };
                        if !json.is_empty() {
                            if let Err(e) = ws.send(Message::Text(json.into())).await {
                                tracing::warn!("failed to resubscribe after reconnect: {}", e);
                                attempt = attempt.saturating_add(1);
                                continue;
                            }
                        }
                    }
                }
                *ctx.state.write().await = ConnectionState::Connected;
                tracing::info!("event stream reconnected");
                return Some(ws);
            }
            Err(e) => {
                tracing::warn!(attempt = attempt + 1, "reconnect attempt failed: {}", e);
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// Reconnect delay for an attempt: the base delay first, then capped
/// exponential growth with jitter.
fn backoff_delay(config: &StreamConfig, attempt: u32) -> Duration {
    let base = config.reconnect_delay.as_millis() as u64;
    let max = config.max_reconnect_delay.as_millis() as u64;
    if attempt == 0 {
        return Duration::from_millis(base.min(max));
    }
    let capped = base.saturating_mul(1u64 << attempt.min(10)).min(max);
    // Jitter: 75-100% of the capped delay.
    let jitter_range = capped / 4;
    let jitter = rand::thread_rng().gen_range(0..=jitter_range);
    Duration::from_millis(capped - jitter_range + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = StreamConfig::default();
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(60));
        assert!(config.auto_resubscribe);
        assert_eq!(config.command_channel_capacity, 100);
    }

    #[test]
    fn test_backoff_first_attempt_is_base_delay() {
        let config = StreamConfig {
            reconnect_delay: Duration::from_millis(5000),
            max_reconnect_delay: Duration::from_millis(60000),
            ..Default::default()
        };
        assert_eq!(backoff_delay(&config, 0), Duration::from_millis(5000));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = StreamConfig {
            reconnect_delay: Duration::from_millis(1000),
            max_reconnect_delay: Duration::from_millis(8000),
            ..Default::default()
        };
        let second = backoff_delay(&config, 1);
        assert!(second.as_millis() >= 1500 && second.as_millis() <= 2000);

        let large = backoff_delay(&config, 10);
        assert!(large.as_millis() >= 6000 && large.as_millis() <= 8000);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_before_connect() {
        let mut stream = AdxEventStream::new("ws://localhost:1/ws", "key-1");
        stream.close().await;
        stream.close().await;
        assert_eq!(stream.state().await, ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_subscribe_before_connect_fails() {
        let stream = AdxEventStream::new("ws://localhost:1/ws", "key-1");
        assert!(matches!(
            stream.subscribe(vec!["bid_won".to_string()]).await,
            Err(AdxError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_connect_after_close_fails() {
        let mut stream = AdxEventStream::new("ws://localhost:1/ws", "key-1");
        stream.close().await;
        assert!(matches!(stream.connect().await, Err(AdxError::StreamClosed)));
    }

    #[tokio::test]
    async fn test_subscribe_after_close_reports_closed() {
        let mut stream = AdxEventStream::new("ws://localhost:1/ws", "key-1");
        stream.close().await;
        assert!(matches!(
            stream.subscribe(vec!["bid_won".to_string()]).await,
            Err(AdxError::StreamClosed)
        ));
    }

    #[tokio::test]
    async fn test_handler_registration_and_removal() {
        let stream = AdxEventStream::new("ws://localhost:1/ws", "key-1");
        let id = stream.on("bid_won", |_| {}).await;
        assert_eq!(stream.handlers.read().await.handler_count("bid_won"), 1);
        stream.off("bid_won", id).await;
        assert_eq!(stream.handlers.read().await.handler_count("bid_won"), 0);
        // Removing again is a no-op.
        stream.off("bid_won", id).await;
    }
}
