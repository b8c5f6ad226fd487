//! Reconnection Policy
//!
//! Exponential backoff with jitter between streamer connection attempts.
//! The policy is reset once a connection delivers data, so a flapping feed
//! starts again from the short delay.

use std::time::Duration;

use rand::Rng;

use crate::infrastructure::config::WebSocketSettings;

/// Backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Growth factor applied after each attempt.
    pub multiplier: f64,
    /// Random spread as a fraction of the delay (0.1 = ±10%).
    pub jitter_factor: f64,
    /// Attempts allowed before giving up (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self::from_websocket_settings(&WebSocketSettings::default())
    }
}

impl ReconnectConfig {
    /// Jitter applied when building from settings.
    pub const DEFAULT_JITTER: f64 = 0.1;

    /// Build from the WebSocket section of the dashboard configuration.
    #[must_use]
    pub const fn from_websocket_settings(settings: &WebSocketSettings) -> Self {
        Self {
            initial_delay: settings.reconnect_delay_initial,
            max_delay: settings.reconnect_delay_max,
            multiplier: settings.reconnect_delay_multiplier,
            jitter_factor: Self::DEFAULT_JITTER,
            max_attempts: settings.max_reconnect_attempts,
        }
    }

    /// Same settings without randomization.
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter_factor = 0.0;
        self
    }
}

/// Stateful backoff sequence.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    base_delay: Duration,
    attempts: u32,
}

impl ReconnectPolicy {
    /// Create a policy at its initial delay.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        let base_delay = config.initial_delay;
        Self {
            config,
            base_delay,
            attempts: 0,
        }
    }

    /// Delay before the next attempt, or `None` once the budget is spent.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }
        self.attempts += 1;

        let delay = self.jittered(self.base_delay);
        self.base_delay = self.grown(self.base_delay);
        Some(delay)
    }

    /// Start over from the initial delay.
    pub const fn reset(&mut self) {
        self.base_delay = self.config.initial_delay;
        self.attempts = 0;
    }

    /// Attempts made since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempts
    }

    /// Check whether another attempt is allowed.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.config.max_attempts == 0 || self.attempts < self.config.max_attempts
    }

    fn grown(&self, delay: Duration) -> Duration {
        let factor = self.config.multiplier;
        if !factor.is_finite() || factor <= 0.0 {
            return self.config.max_delay.min(delay);
        }
        // mul_f64 panics on overflow, so clamp in floating point first.
        let next_secs = delay.as_secs_f64() * factor;
        if next_secs >= self.config.max_delay.as_secs_f64() {
            self.config.max_delay
        } else {
            Duration::from_secs_f64(next_secs)
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        let spread = self.config.jitter_factor;
        if spread <= 0.0 || delay.is_zero() {
            return delay;
        }
        let offset: f64 = rand::rng().random_range(-spread..=spread);
        let secs = (delay.as_secs_f64() * (1.0 + offset)).max(0.001);
        Duration::from_secs_f64(secs)
    }
}

/// Error type for reconnection failures.
#[derive(Debug, thiserror::Error)]
pub enum ReconnectError {
    /// Retry budget spent.
    #[error("maximum reconnection attempts ({0}) exceeded")]
    MaxAttemptsExceeded(u32),
}
