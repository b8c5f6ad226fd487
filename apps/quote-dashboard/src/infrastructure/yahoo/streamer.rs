//! Streamer WebSocket Client
//!
//! Connects to the Yahoo Finance streamer for push price updates.
//!
//! # Stream URL
//!
//! - `wss://streamer.finance.yahoo.com/?version=2`
//!
//! # Protocol
//!
//! No authentication. After connecting the client sends one JSON subscribe
//! frame listing every symbol; the server then pushes base64-encoded
//! protobuf pricing messages as text frames. The subscription is resent on
//! every reconnect.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::codec::{CodecError, StreamCodec, decode_tick};
use super::heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
use super::reconnect::{ReconnectConfig, ReconnectError, ReconnectPolicy};
use crate::domain::feed::FeedEvent;
use crate::domain::quote::Symbol;
use crate::infrastructure::config::WebSocketSettings;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the streamer client.
#[derive(Debug, thiserror::Error)]
pub enum StreamClientError {
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Reconnection budget spent.
    #[error(transparent)]
    Reconnect(#[from] ReconnectError),

    /// No data or pong within the heartbeat timeout.
    #[error("heartbeat timeout")]
    HeartbeatTimeout,

    /// Connection closed by the server.
    #[error("connection closed")]
    ConnectionClosed,
}

// =============================================================================
// Streamer Client Configuration
// =============================================================================

/// Configuration for the streamer client.
#[derive(Debug, Clone)]
pub struct StreamerClientConfig {
    /// WebSocket URL.
    pub url: String,
    /// Symbols to subscribe to.
    pub symbols: Vec<Symbol>,
    /// Reconnection configuration.
    pub reconnect: ReconnectConfig,
    /// Heartbeat configuration.
    pub heartbeat: HeartbeatConfig,
}

impl StreamerClientConfig {
    /// Build from the WebSocket section of the dashboard configuration.
    #[must_use]
    pub fn from_settings(settings: &WebSocketSettings, symbols: Vec<Symbol>) -> Self {
        Self {
            url: settings.url.clone(),
            symbols,
            reconnect: ReconnectConfig::from_websocket_settings(settings),
            heartbeat: HeartbeatConfig::from_websocket_settings(settings),
        }
    }
}

// =============================================================================
// Streamer Client
// =============================================================================

/// Push feed client.
///
/// Manages the connection lifecycle:
/// - Subscription on every (re)connect
/// - Heartbeat monitoring
/// - Automatic reconnection with exponential backoff
///
/// Decoded updates leave through the event channel as [`FeedEvent`]s. The
/// channel closes when the client is dropped after `run` returns.
pub struct StreamerClient {
    config: StreamerClientConfig,
    codec: StreamCodec,
    event_tx: mpsc::Sender<FeedEvent>,
    cancel: CancellationToken,
}

impl StreamerClient {
    /// Create a new streamer client.
    #[must_use]
    pub const fn new(
        config: StreamerClientConfig,
        event_tx: mpsc::Sender<FeedEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            codec: StreamCodec::new(),
            event_tx,
            cancel,
        }
    }

    /// Run the connection loop until cancelled or the retry budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`StreamClientError::Reconnect`] when reconnection gives up.
    pub async fn run(self: Arc<Self>) -> Result<(), StreamClientError> {
        let mut reconnect_policy = ReconnectPolicy::new(self.config.reconnect.clone());

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Streamer client cancelled");
                return Ok(());
            }

            match self.connect_and_run(&mut reconnect_policy).await {
                Ok(()) => {
                    tracing::info!("Streamer connection closed on shutdown");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Streamer connection error");
                    self.emit(FeedEvent::Disconnected).await;

                    let Some(delay) = reconnect_policy.next_delay() else {
                        let err =
                            ReconnectError::MaxAttemptsExceeded(reconnect_policy.attempt_count());
                        self.emit(FeedEvent::Error(err.to_string())).await;
                        return Err(err.into());
                    };

                    let attempt = reconnect_policy.attempt_count();
                    tracing::info!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Reconnecting to streamer"
                    );
                    self.emit(FeedEvent::Reconnecting { attempt }).await;

                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            tracing::info!("Streamer client cancelled during reconnect delay");
                            return Ok(());
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Connect, subscribe and pump frames until error or cancellation.
    async fn connect_and_run(
        &self,
        reconnect_policy: &mut ReconnectPolicy,
    ) -> Result<(), StreamClientError> {
        tracing::info!(url = %self.config.url, "Connecting to streamer");

        let connect = tokio_tungstenite::connect_async(self.config.url.as_str());
        let (ws_stream, _response) = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            result = connect => result?,
        };
        let (mut write, mut read) = ws_stream.split();

        let subscribe = self.codec.encode_subscribe(&self.config.symbols)?;
        write.send(Message::Text(subscribe.into())).await?;
        tracing::info!(symbols = ?self.config.symbols, "Subscription sent");
        self.emit(FeedEvent::Subscribing).await;

        // Heartbeat lives exactly as long as this connection.
        let heartbeat_state = Arc::new(HeartbeatState::new());
        let (heartbeat_tx, mut heartbeat_rx) = mpsc::channel::<HeartbeatEvent>(10);
        let heartbeat_cancel = self.cancel.child_token();
        let _heartbeat_guard = heartbeat_cancel.clone().drop_guard();
        tokio::spawn(
            HeartbeatManager::new(
                self.config.heartbeat,
                Arc::clone(&heartbeat_state),
                heartbeat_tx,
                heartbeat_cancel,
            )
            .run(),
        );

        let mut received_data = false;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                Some(heartbeat_event) = heartbeat_rx.recv() => {
                    match heartbeat_event {
                        HeartbeatEvent::SendPing => {
                            write.send(Message::Ping(Vec::new().into())).await?;
                        }
                        HeartbeatEvent::Timeout => {
                            return Err(StreamClientError::HeartbeatTimeout);
                        }
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            heartbeat_state.record_activity();
                            if !received_data {
                                received_data = true;
                                reconnect_policy.reset();
                            }
                            self.handle_text_message(&text).await;
                        }
                        Some(Ok(Message::Pong(_) | Message::Binary(_))) => {
                            heartbeat_state.record_activity();
                        }
                        Some(Ok(Message::Ping(data))) => {
                            heartbeat_state.record_activity();
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(frame = ?frame, "Server sent close frame");
                            return Err(StreamClientError::ConnectionClosed);
                        }
                        Some(Ok(Message::Frame(_))) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::info!("WebSocket stream ended");
                            return Err(StreamClientError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Decode a text frame and forward the result.
    async fn handle_text_message(&self, text: &str) {
        let event = match decode_tick(&self.codec, text) {
            Ok(Ok(tick)) => FeedEvent::Tick(tick),
            Ok(Err(rejection)) => FeedEvent::Rejected(rejection),
            Err(e) => FeedEvent::Malformed(e.to_string()),
        };
        self.emit(event).await;
    }

    async fn emit(&self, event: FeedEvent) {
        if self.event_tx.send(event).await.is_err() {
            tracing::debug!("Feed event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn config_from_settings() {
        let settings = WebSocketSettings {
            url: "ws://127.0.0.1:1".to_string(),
            max_reconnect_attempts: 4,
            ..WebSocketSettings::default()
        };
        let config = StreamerClientConfig::from_settings(&settings, vec!["BTC-USD".to_string()]);

        assert_eq!(config.url, "ws://127.0.0.1:1");
        assert_eq!(config.symbols, ["BTC-USD"]);
        assert_eq!(config.reconnect.max_attempts, 4);
        assert_eq!(config.heartbeat.ping_interval, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn gives_up_after_retry_budget() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let settings = WebSocketSettings {
            url: format!("ws://{addr}"),
            reconnect_delay_initial: Duration::from_millis(1),
            reconnect_delay_max: Duration::from_millis(2),
            max_reconnect_attempts: 2,
            ..WebSocketSettings::default()
        };
        let (tx, mut rx) = mpsc::channel(16);
        let client = Arc::new(StreamerClient::new(
            StreamerClientConfig::from_settings(&settings, vec!["BTC-USD".to_string()]),
            tx,
            CancellationToken::new(),
        ));

        let result = tokio::time::timeout(Duration::from_secs(5), client.run()).await.unwrap();
        assert!(matches!(result, Err(StreamClientError::Reconnect(_))));

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events.iter().filter(|e| matches!(e, FeedEvent::Reconnecting { .. })).count(),
            2
        );
        assert!(matches!(events.last(), Some(FeedEvent::Error(_))));
    }

    #[tokio::test]
    async fn cancelled_before_start_returns_ok() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (tx, _rx) = mpsc::channel(1);
        let config = StreamerClientConfig::from_settings(&WebSocketSettings::default(), Vec::new());
        let client = Arc::new(StreamerClient::new(config, tx, cancel));
        assert!(client.run().await.is_ok());
    }
}
