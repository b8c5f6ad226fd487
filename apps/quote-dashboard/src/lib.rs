#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Quote Dashboard - Live Terminal Quote Board
//!
//! Keeps a small fixed set of instruments current by merging a one-shot
//! history snapshot with a push price feed, and redraws a terminal table on
//! a fixed cadence that is independent of when updates arrive.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Quote state and the types it is built from
//!   - `instrument`: Static universe and book values
//!   - `quote`: Observations and the `QuoteStore`
//!   - `feed`: Push feed state and events
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: `HistoryProvider`, `DisplaySurface`
//!   - `services`: Snapshot loader, stream ingestor, render pipeline and loop
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `yahoo`: Chart API client, streamer WebSocket client, codec
//!   - `terminal`: ratatui display surface
//!   - `config`: Environment-based configuration
//!   - `telemetry` / `metrics`: Logging and Prometheus counters
//!
//! # Data Flow
//!
//! ```text
//! Chart API ──► SnapshotLoader ──┐
//!                                ▼
//!                           QuoteStore ──► render loop ──► terminal
//!                                ▲          (fixed cadence)
//! Streamer WS ──► StreamIngestor ┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Quote state types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::feed::{FeedEvent, FeedState, FeedStatus};
pub use domain::instrument::{Instrument, Universe};
pub use domain::quote::{
    Availability, Observation, PriceTick, QuoteEntry, QuoteSnapshot, QuoteStore, Symbol,
    TickRejection,
};

// Ports and services
pub use application::ports::{
    BarField, DisplaySurface, HistoryProvider, HistoryRequest, HistoryTable, ProviderError,
};
pub use application::services::{
    IngestionTasks, RenderContext, RenderFrame, ShutdownOutcome, SnapshotLoader, SnapshotReport,
    StreamIngestor, build_frame, run_render_loop,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, DashboardConfig, WebSocketSettings};

// Yahoo adapters
pub use infrastructure::yahoo::{StreamerClient, StreamerClientConfig, YahooChartClient};

// Terminal
pub use infrastructure::terminal::TerminalSurface;

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, init as init_telemetry};
