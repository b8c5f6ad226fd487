//! Stream Ingestor
//!
//! Consumes events from the push feed client and turns each usable tick into
//! a quote store update. Nothing received here can fail the render loop:
//! bad messages are counted, logged and dropped.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::feed::{FeedEvent, FeedState, FeedStatus};
use crate::domain::instrument::Universe;
use crate::domain::quote::{QuoteEntry, QuoteStore, TickRejection};
use crate::infrastructure::metrics;

/// Applies feed events to the shared quote store and feed status.
#[derive(Clone)]
pub struct StreamIngestor {
    store: Arc<QuoteStore>,
    universe: Arc<Universe>,
    feed: Arc<FeedStatus>,
}

impl StreamIngestor {
    /// Create a new ingestor.
    #[must_use]
    pub const fn new(
        store: Arc<QuoteStore>,
        universe: Arc<Universe>,
        feed: Arc<FeedStatus>,
    ) -> Self {
        Self {
            store,
            universe,
            feed,
        }
    }

    /// Consume events until the sender side closes, then mark the feed stopped.
    pub async fn run(self, mut rx: mpsc::Receiver<FeedEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(event);
        }

        self.feed.set_state(FeedState::Stopped);
        metrics::set_feed_state(FeedState::Stopped);
        tracing::info!(
            applied = self.feed.ticks_applied(),
            dropped = self.feed.ticks_dropped(),
            "Stream ingestion stopped"
        );
    }

    /// Handle a single event.
    ///
    /// Returns the stored entry when the event was a tick that was applied.
    pub fn handle(&self, event: FeedEvent) -> Option<QuoteEntry> {
        match event {
            FeedEvent::Subscribing => {
                self.transition(FeedState::Subscribing);
                tracing::info!("Feed subscription sent");
                None
            }
            FeedEvent::Disconnected => {
                self.transition(FeedState::Disconnected);
                tracing::warn!("Feed disconnected, showing last known values");
                None
            }
            FeedEvent::Reconnecting { attempt } => {
                self.feed.increment_reconnect_attempts();
                metrics::record_reconnect();
                tracing::info!(attempt, "Feed reconnecting");
                None
            }
            FeedEvent::Tick(tick) => {
                if !self.universe.contains(&tick.symbol) {
                    self.drop_message(&TickRejection::UnknownSymbol(tick.symbol));
                    return None;
                }

                let entry = self.store.apply_tick(&tick);
                let was_subscribing = self.feed.state() == FeedState::Subscribing;
                self.feed.record_tick();
                if was_subscribing {
                    metrics::set_feed_state(FeedState::Streaming);
                }
                metrics::record_tick_applied();
                tracing::trace!(symbol = %tick.symbol, price = %tick.price, "Tick applied");
                Some(entry)
            }
            FeedEvent::Rejected(rejection) => {
                self.drop_message(&rejection);
                None
            }
            FeedEvent::Malformed(reason) => {
                self.feed.record_drop();
                metrics::record_tick_dropped("malformed");
                tracing::warn!(error = %reason, "Dropped undecodable feed message");
                None
            }
            FeedEvent::Error(message) => {
                tracing::error!(error = %message, "Feed error");
                self.feed.set_error(message);
                metrics::set_feed_state(self.feed.state());
                None
            }
        }
    }

    fn transition(&self, state: FeedState) {
        self.feed.set_state(state);
        metrics::set_feed_state(self.feed.state());
    }

    fn drop_message(&self, rejection: &TickRejection) {
        self.feed.record_drop();
        metrics::record_tick_dropped(rejection.reason());
        tracing::debug!(reason = rejection.reason(), error = %rejection, "Dropped feed message");
    }
}
