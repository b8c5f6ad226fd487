//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `HistoryProvider`: bulk historical query used to prime the store
//! - `DisplaySurface`: where rendered frames are presented

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::application::services::render::RenderFrame;
use crate::domain::quote::Symbol;

// =============================================================================
// History Provider
// =============================================================================

/// Bulk history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Instruments to fetch.
    pub symbols: Vec<Symbol>,
    /// Look-back period (e.g. `1d`).
    pub period: String,
    /// Bar interval (e.g. `1m`).
    pub interval: String,
}

/// Columns carried per instrument in a history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarField {
    /// Bar close price.
    Close,
    /// Bar volume.
    Volume,
}

impl BarField {
    /// Column name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Volume => "volume",
        }
    }
}

/// Tabular history result keyed by instrument and field.
///
/// Cells are kept as raw JSON values so that consumers can tell a missing
/// value from a value of the wrong type.
#[derive(Debug, Clone, Default)]
pub struct HistoryTable {
    columns: HashMap<Symbol, HashMap<BarField, Vec<Value>>>,
    failures: HashMap<Symbol, String>,
}

impl HistoryTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column for an instrument, replacing any existing one.
    pub fn insert_column(&mut self, symbol: &str, field: BarField, values: Vec<Value>) {
        self.columns
            .entry(symbol.to_string())
            .or_default()
            .insert(field, values);
    }

    /// Record that the provider could not supply data for an instrument.
    pub fn record_failure(&mut self, symbol: &str, reason: impl Into<String>) {
        self.failures.insert(symbol.to_string(), reason.into());
    }

    /// Get a column.
    #[must_use]
    pub fn column(&self, symbol: &str, field: BarField) -> Option<&[Value]> {
        self.columns
            .get(symbol)
            .and_then(|fields| fields.get(&field))
            .map(Vec::as_slice)
    }

    /// Check if the instrument has any columns.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.columns.contains_key(symbol)
    }

    /// Provider-reported failure for an instrument.
    #[must_use]
    pub fn failure(&self, symbol: &str) -> Option<&str> {
        self.failures.get(symbol).map(String::as_str)
    }

    /// Check if no instrument has any data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All recorded failures.
    pub fn failures(&self) -> impl Iterator<Item = (&Symbol, &String)> {
        self.failures.iter()
    }
}

/// Errors from a history provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned status {status} for {symbol}")]
    Status {
        /// Instrument requested.
        symbol: Symbol,
        /// HTTP status code.
        status: u16,
    },

    /// Body could not be decoded.
    #[error("invalid provider response: {0}")]
    Decode(String),

    /// Nothing usable came back for any instrument.
    #[error("provider returned no data: {0}")]
    EmptyResult(String),
}

/// Bulk historical data source.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetch recent bars for every requested instrument.
    ///
    /// Per-instrument problems should be recorded in the table with
    /// [`HistoryTable::record_failure`]; an `Err` means the whole request failed.
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<HistoryTable, ProviderError>;
}

// =============================================================================
// Display Surface
// =============================================================================

/// Destination for rendered frames.
pub trait DisplaySurface {
    /// Replace whatever is currently displayed with `frame`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying output fails.
    fn present(&mut self, frame: &RenderFrame) -> std::io::Result<()>;
}
