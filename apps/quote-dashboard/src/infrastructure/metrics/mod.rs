//! Prometheus Metrics Module
//!
//! Exposes dashboard metrics in Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Feed**: Ticks applied and dropped, reconnects, connection state
//! - **Snapshot**: Instruments loaded or unavailable at startup
//! - **Render**: Frames presented
//!
//! # Integration
//!
//! The exporter listens on `127.0.0.1:<port>` and is only installed when a
//! non-zero port is configured. Without it the recording functions are no-ops.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::domain::feed::FeedState;

// =============================================================================
// Exporter
// =============================================================================

static EXPORTER_ADDR: OnceLock<SocketAddr> = OnceLock::new();

/// Install the Prometheus recorder and HTTP listener.
///
/// Returns the listen address, or `None` when `port` is 0. Calling this
/// again after a successful install returns the first address.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an error if the recorder or listener cannot be installed.
pub fn init_metrics(port: u16) -> Result<Option<SocketAddr>, BuildError> {
    if port == 0 {
        return Ok(None);
    }
    if let Some(addr) = EXPORTER_ADDR.get() {
        return Ok(Some(*addr));
    }

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    register_metrics();

    Ok(Some(*EXPORTER_ADDR.get_or_init(|| addr)))
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "quote_dashboard_ticks_applied_total",
        "Push feed ticks applied to the quote store"
    );
    describe_counter!(
        "quote_dashboard_ticks_dropped_total",
        "Push feed messages dropped, by reason"
    );
    describe_counter!(
        "quote_dashboard_reconnects_total",
        "Push feed reconnection attempts"
    );
    describe_counter!(
        "quote_dashboard_frames_rendered_total",
        "Frames presented to the display surface"
    );
    describe_gauge!(
        "quote_dashboard_snapshot_instruments",
        "Instruments primed by the initial snapshot, by outcome"
    );
    describe_gauge!(
        "quote_dashboard_feed_state",
        "Push feed state (0 disconnected, 1 subscribing, 2 streaming, 3 stopped)"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a tick applied to the store.
pub fn record_tick_applied() {
    counter!("quote_dashboard_ticks_applied_total").increment(1);
}

/// Record a dropped feed message.
pub fn record_tick_dropped(reason: &'static str) {
    counter!("quote_dashboard_ticks_dropped_total", "reason" => reason).increment(1);
}

/// Record a reconnection attempt.
pub fn record_reconnect() {
    counter!("quote_dashboard_reconnects_total").increment(1);
}

/// Record a presented frame.
pub fn record_frame_rendered() {
    counter!("quote_dashboard_frames_rendered_total").increment(1);
}

/// Record the outcome of the initial snapshot.
#[allow(clippy::cast_precision_loss)]
pub fn record_snapshot(loaded: usize, unavailable: usize) {
    gauge!("quote_dashboard_snapshot_instruments", "outcome" => "loaded").set(loaded as f64);
    gauge!("quote_dashboard_snapshot_instruments", "outcome" => "unavailable")
        .set(unavailable as f64);
}

/// Update the feed state gauge.
pub fn set_feed_state(state: FeedState) {
    gauge!("quote_dashboard_feed_state").set(f64::from(state.code()));
}

// =============================================================================
// Tests
// =============================================================================
