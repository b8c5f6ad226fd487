//! Dashboard Configuration Settings
//!
//! Configuration types for the dashboard, loaded from environment variables.
//! Every variable is optional.

use std::path::PathBuf;
use std::time::Duration;

/// Default Yahoo chart API host.
pub const DEFAULT_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Default Yahoo streamer endpoint.
pub const DEFAULT_STREAM_URL: &str = "wss://streamer.finance.yahoo.com/?version=2";

/// Render loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Sleep between frames.
    pub interval: Duration,
    /// How long to wait for ingestion tasks on shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Bulk history query settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySettings {
    /// Look-back period (`range` parameter).
    pub period: String,
    /// Bar interval.
    pub interval: String,
    /// Chart API base URL.
    pub base_url: String,
    /// HTTP request timeout.
    pub http_timeout: Duration,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            period: "1d".to_string(),
            interval: "1m".to_string(),
            base_url: DEFAULT_CHART_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(10),
        }
    }
}

/// WebSocket connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct WebSocketSettings {
    /// Streamer endpoint.
    pub url: String,
    /// Heartbeat ping interval.
    pub heartbeat_interval: Duration,
    /// Heartbeat timeout before considering connection dead.
    pub heartbeat_timeout: Duration,
    /// Initial reconnection delay.
    pub reconnect_delay_initial: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub reconnect_delay_multiplier: f64,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_reconnect_attempts: u32,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            heartbeat_interval: Duration::from_secs(15),
            heartbeat_timeout: Duration::from_secs(30),
            reconnect_delay_initial: Duration::from_millis(500),
            reconnect_delay_max: Duration::from_secs(30),
            reconnect_delay_multiplier: 2.0,
            max_reconnect_attempts: 0, // Unlimited
        }
    }
}

/// Logging and metrics settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySettings {
    /// Prometheus exporter port (0 = disabled).
    pub metrics_port: u16,
    /// Append logs to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardConfig {
    /// Render loop settings.
    pub render: RenderSettings,
    /// Snapshot query settings.
    pub history: HistorySettings,
    /// Push feed connection settings.
    pub websocket: WebSocketSettings,
    /// Logging and metrics settings.
    pub telemetry: TelemetrySettings,
}

impl DashboardConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value that cannot be used.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// Unparsable numbers fall back to their defaults. Empty strings count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero render or heartbeat
    /// period and for a stream URL that is not `ws://` or `wss://`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let render_defaults = RenderSettings::default();
        let render = RenderSettings {
            interval: parse_duration_millis(
                &var,
                "QUOTES_RENDER_INTERVAL_MS",
                render_defaults.interval,
            ),
            shutdown_timeout: parse_duration_secs(
                &var,
                "QUOTES_SHUTDOWN_TIMEOUT_SECS",
                render_defaults.shutdown_timeout,
            ),
        };

        require_non_zero("QUOTES_RENDER_INTERVAL_MS", render.interval)?;

        let history_defaults = HistorySettings::default();
        let history = HistorySettings {
            period: var("QUOTES_HISTORY_PERIOD").unwrap_or(history_defaults.period),
            interval: var("QUOTES_HISTORY_INTERVAL").unwrap_or(history_defaults.interval),
            base_url: var("QUOTES_CHART_BASE_URL")
                .map_or(history_defaults.base_url, |url| url.trim_end_matches('/').to_string()),
            http_timeout: parse_duration_secs(
                &var,
                "QUOTES_HTTP_TIMEOUT_SECS",
                history_defaults.http_timeout,
            ),
        };

        let ws_defaults = WebSocketSettings::default();
        let websocket = WebSocketSettings {
            url: var("QUOTES_STREAM_URL").unwrap_or(ws_defaults.url),
            heartbeat_interval: parse_duration_secs(
                &var,
                "QUOTES_HEARTBEAT_INTERVAL_SECS",
                ws_defaults.heartbeat_interval,
            ),
            heartbeat_timeout: parse_duration_secs(
                &var,
                "QUOTES_HEARTBEAT_TIMEOUT_SECS",
                ws_defaults.heartbeat_timeout,
            ),
            reconnect_delay_initial: parse_duration_millis(
                &var,
                "QUOTES_RECONNECT_DELAY_INITIAL_MS",
                ws_defaults.reconnect_delay_initial,
            ),
            reconnect_delay_max: parse_duration_secs(
                &var,
                "QUOTES_RECONNECT_DELAY_MAX_SECS",
                ws_defaults.reconnect_delay_max,
            ),
            reconnect_delay_multiplier: parse_var(
                &var,
                "QUOTES_RECONNECT_DELAY_MULTIPLIER",
                ws_defaults.reconnect_delay_multiplier,
            ),
            max_reconnect_attempts: parse_var(
                &var,
                "QUOTES_MAX_RECONNECT_ATTEMPTS",
                ws_defaults.max_reconnect_attempts,
            ),
        };

        require_non_zero("QUOTES_HEARTBEAT_INTERVAL_SECS", websocket.heartbeat_interval)?;
        require_non_zero("QUOTES_HEARTBEAT_TIMEOUT_SECS", websocket.heartbeat_timeout)?;

        if !websocket.url.starts_with("ws://") && !websocket.url.starts_with("wss://") {
            return Err(ConfigError::InvalidValue {
                key: "QUOTES_STREAM_URL".to_string(),
                reason: format!("expected a ws:// or wss:// URL, got {}", websocket.url),
            });
        }

        let telemetry = TelemetrySettings {
            metrics_port: parse_var(&var, "QUOTES_METRICS_PORT", 0),
            log_file: var("QUOTES_LOG_FILE").map(PathBuf::from),
        };

        Ok(Self {
            render,
            history,
            websocket,
            telemetry,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable holds a value that cannot be used.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn require_non_zero(key: &str, period: Duration) -> Result<(), ConfigError> {
    if period.is_zero() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn parse_var<F, T>(var: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    var(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_duration_secs<F>(var: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_duration_millis<F>(var: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn config_from(pairs: &[(&str, &str)]) -> Result<DashboardConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DashboardConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.render.interval, Duration::from_millis(250));
        assert_eq!(config.history.period, "1d");
        assert_eq!(config.history.interval, "1m");
        assert_eq!(config.websocket.url, DEFAULT_STREAM_URL);
        assert_eq!(config.telemetry.metrics_port, 0);
        assert!(config.telemetry.log_file.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("QUOTES_RENDER_INTERVAL_MS", "500"),
            ("QUOTES_HISTORY_PERIOD", "5d"),
            ("QUOTES_CHART_BASE_URL", "http://127.0.0.1:9000/"),
            ("QUOTES_STREAM_URL", "ws://127.0.0.1:9001"),
            ("QUOTES_MAX_RECONNECT_ATTEMPTS", "3"),
            ("QUOTES_RECONNECT_DELAY_MULTIPLIER", "1.5"),
            ("QUOTES_METRICS_PORT", "9100"),
            ("QUOTES_LOG_FILE", "/tmp/quotes.log"),
        ])
        .unwrap();

        assert_eq!(config.render.interval, Duration::from_millis(500));
        assert_eq!(config.history.period, "5d");
        assert_eq!(config.history.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.websocket.url, "ws://127.0.0.1:9001");
        assert_eq!(config.websocket.max_reconnect_attempts, 3);
        assert!((config.websocket.reconnect_delay_multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.telemetry.metrics_port, 9100);
        assert_eq!(config.telemetry.log_file, Some(PathBuf::from("/tmp/quotes.log")));
    }

    #[test_case("QUOTES_RENDER_INTERVAL_MS" ; "render interval")]
    #[test_case("QUOTES_HEARTBEAT_INTERVAL_SECS" ; "heartbeat interval")]
    #[test_case("QUOTES_HEARTBEAT_TIMEOUT_SECS" ; "heartbeat timeout")]
    fn zero_period_is_rejected(var: &str) {
        let err = config_from(&[(var, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == var));
    }

    #[test]
    fn non_websocket_stream_url_is_rejected() {
        assert!(config_from(&[("QUOTES_STREAM_URL", "https://example.com")]).is_err());
    }

    #[test]
    fn unparsable_and_blank_values_fall_back() {
        let config = config_from(&[
            ("QUOTES_HEARTBEAT_INTERVAL_SECS", "soon"),
            ("QUOTES_HISTORY_INTERVAL", "  "),
        ])
        .unwrap();
        assert_eq!(config.websocket.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(config.history.interval, "1m");
    }

    #[test]
    fn websocket_settings_defaults() {
        let settings = WebSocketSettings::default();
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(settings.heartbeat_timeout, Duration::from_secs(30));
        assert_eq!(settings.reconnect_delay_initial, Duration::from_millis(500));
        assert_eq!(settings.reconnect_delay_max, Duration::from_secs(30));
        assert!((settings.reconnect_delay_multiplier - 2.0).abs() < f64::EPSILON);
    }
}
