//! Feed Status
//!
//! Connection state of the push feed, shared between the ingestion task
//! (writer) and the render pipeline (reader).

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::quote::{PriceTick, TickRejection};

/// Lifecycle state of the push feed.
///
/// `Disconnected → Subscribing → Streaming`, back to `Disconnected` on error.
/// `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    /// No connection.
    #[default]
    Disconnected,
    /// Connected, subscription sent, no data yet.
    Subscribing,
    /// Receiving data.
    Streaming,
    /// Ingestion has ended; values are frozen.
    Stopped,
}

impl FeedState {
    /// Display label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Subscribing => "subscribing",
            Self::Streaming => "streaming",
            Self::Stopped => "stopped",
        }
    }

    /// Numeric code for the state gauge.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Subscribing => 1,
            Self::Streaming => 2,
            Self::Stopped => 3,
        }
    }
}

/// Events emitted by a push feed client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Connected and subscription request sent.
    Subscribing,
    /// Connection lost.
    Disconnected,
    /// Waiting before another connection attempt.
    Reconnecting {
        /// Reconnection attempt number.
        attempt: u32,
    },
    /// A normalized price update.
    Tick(PriceTick),
    /// A decoded message that cannot be applied.
    Rejected(TickRejection),
    /// A frame that could not be decoded at all.
    Malformed(String),
    /// Feed-level error reported by the client.
    Error(String),
}

/// Shared feed status and counters.
#[derive(Debug, Default)]
pub struct FeedStatus {
    state: RwLock<FeedState>,
    last_message_at: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
    reconnect_attempts: AtomicU32,
    ticks_applied: AtomicU64,
    ticks_dropped: AtomicU64,
}

impl FeedStatus {
    /// Create a status in the `Disconnected` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection state.
    ///
    /// Once `Stopped`, the state no longer changes.
    pub fn set_state(&self, state: FeedState) {
        let mut current = self.state.write();
        if *current == FeedState::Stopped {
            return;
        }
        *current = state;
        if state == FeedState::Streaming {
            self.reconnect_attempts.store(0, Ordering::Relaxed);
            *self.last_error.write() = None;
        }
    }

    /// Record an error and drop to `Disconnected`.
    pub fn set_error(&self, message: String) {
        self.set_state(FeedState::Disconnected);
        *self.last_error.write() = Some(message);
    }

    /// Record an applied tick; moves `Subscribing` to `Streaming`.
    pub fn record_tick(&self) {
        self.ticks_applied.fetch_add(1, Ordering::Relaxed);
        *self.last_message_at.write() = Some(Utc::now());
        if self.state() == FeedState::Subscribing {
            self.set_state(FeedState::Streaming);
        }
    }

    /// Record a dropped message.
    pub fn record_drop(&self) {
        self.ticks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment reconnect attempts.
    pub fn increment_reconnect_attempts(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> FeedState {
        *self.state.read()
    }

    /// Time of the last applied tick.
    #[must_use]
    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        *self.last_message_at.read()
    }

    /// Last reported error, cleared once streaming resumes.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Reconnect attempts since the last successful stream.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    /// Ticks applied to the store.
    #[must_use]
    pub fn ticks_applied(&self) -> u64 {
        self.ticks_applied.load(Ordering::Relaxed)
    }

    /// Messages dropped.
    #[must_use]
    pub fn ticks_dropped(&self) -> u64 {
        self.ticks_dropped.load(Ordering::Relaxed)
    }
}
