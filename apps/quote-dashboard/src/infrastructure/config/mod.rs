//! Configuration Module
//!
//! Configuration loading for the dashboard.

mod settings;

pub use settings::{
    ConfigError, DEFAULT_CHART_BASE_URL, DEFAULT_STREAM_URL, DashboardConfig, HistorySettings,
    RenderSettings, TelemetrySettings, WebSocketSettings,
};
