//! Heartbeat Manager
//!
//! Liveness check for the streamer connection. Pings go out on a fixed
//! interval; any inbound frame (data or pong) counts as a sign of life. When
//! nothing arrives within the timeout the manager asks for a reconnect.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::infrastructure::config::WebSocketSettings;

/// Heartbeat timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Interval between pings.
    pub ping_interval: Duration,
    /// Silence tolerated before the connection is declared dead.
    pub timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::from_websocket_settings(&WebSocketSettings::default())
    }
}

impl HeartbeatConfig {
    /// Build from the WebSocket section of the dashboard configuration.
    #[must_use]
    pub const fn from_websocket_settings(settings: &WebSocketSettings) -> Self {
        Self {
            ping_interval: settings.heartbeat_interval,
            timeout: settings.heartbeat_timeout,
        }
    }
}

/// Requests from the heartbeat manager to the connection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatEvent {
    /// Send a ping frame.
    SendPing,
    /// Nothing heard within the timeout.
    Timeout,
}

/// Last-activity timestamp shared with the connection loop.
#[derive(Debug)]
pub struct HeartbeatState {
    last_activity: Mutex<Instant>,
}

impl Default for HeartbeatState {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartbeatState {
    /// Create state stamped with the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Record an inbound frame.
    pub fn record_activity(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since the last inbound frame.
    #[must_use]
    pub fn silence(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }
}

/// Periodic liveness checker, one per connection.
pub struct HeartbeatManager {
    config: HeartbeatConfig,
    state: Arc<HeartbeatState>,
    event_tx: mpsc::Sender<HeartbeatEvent>,
    cancel: CancellationToken,
}

impl HeartbeatManager {
    /// Create a new heartbeat manager.
    #[must_use]
    pub const fn new(
        config: HeartbeatConfig,
        state: Arc<HeartbeatState>,
        event_tx: mpsc::Sender<HeartbeatEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            state,
            event_tx,
            cancel,
        }
    }

    /// Run until cancelled, the receiver goes away, or a timeout is reported.
    pub async fn run(self) {
        let start = Instant::now() + self.config.ping_interval;
        let mut ticker = tokio::time::interval_at(start, self.config.ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("Heartbeat manager cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let silence = self.state.silence();
                    let event = if silence > self.config.timeout {
                        tracing::warn!(
                            silence_secs = silence.as_secs(),
                            timeout_secs = self.config.timeout.as_secs(),
                            "Heartbeat timeout detected"
                        );
                        HeartbeatEvent::Timeout
                    } else {
                        HeartbeatEvent::SendPing
                    };

                    if self.event_tx.send(event).await.is_err()
                        || event == HeartbeatEvent::Timeout
                    {
                        break;
                    }
                }
            }
        }
    }
}
