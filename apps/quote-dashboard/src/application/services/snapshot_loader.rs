//! Snapshot Loader
//!
//! One-shot bulk fetch that primes the quote store before streaming starts.
//!
//! Failures never abort the load. A request-level failure marks every
//! instrument unavailable and is reported once; a per-instrument failure
//! only affects that instrument.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;

use crate::application::ports::{BarField, HistoryProvider, HistoryRequest, HistoryTable};
use crate::domain::instrument::Universe;
use crate::domain::quote::{Availability, QuoteStore, Symbol};
use crate::infrastructure::metrics;

/// Why an instrument could not be primed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// The whole request failed, or the provider reported a failure for this instrument.
    #[error("provider error: {0}")]
    Provider(String),

    /// The instrument is absent from the result.
    #[error("instrument not in result")]
    NotInResult,

    /// No usable value for a field.
    #[error("no value for {}", .0.as_str())]
    ValueMissing(BarField),

    /// A value of the wrong type.
    #[error("{} has unexpected value {found}", .field.as_str())]
    TypeMismatch {
        /// Column holding the bad value.
        field: BarField,
        /// The value as received.
        found: String,
    },
}

impl SnapshotError {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider_error",
            Self::NotInResult => "not_in_result",
            Self::ValueMissing(_) => "value_missing",
            Self::TypeMismatch { .. } => "type_mismatch",
        }
    }
}

/// Last usable bar for an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastBar {
    /// Close price.
    pub close: Decimal,
    /// Volume of the same bar.
    pub volume: u64,
}

/// Outcome of a load, in universe order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReport {
    /// Per-instrument result.
    pub instruments: Vec<(Symbol, Result<LastBar, SnapshotError>)>,
    /// Set when the request failed as a whole.
    pub total_failure: Option<String>,
}

impl SnapshotReport {
    /// Number of instruments primed with real data.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.instruments.iter().filter(|(_, r)| r.is_ok()).count()
    }

    /// Number of instruments marked unavailable.
    #[must_use]
    pub fn unavailable(&self) -> usize {
        self.instruments.len() - self.loaded()
    }
}

/// Loads the initial snapshot into the store.
pub struct SnapshotLoader<'a> {
    provider: &'a dyn HistoryProvider,
    period: String,
    interval: String,
}

impl<'a> SnapshotLoader<'a> {
    /// Create a loader for the given look-back period and bar interval.
    #[must_use]
    pub fn new(
        provider: &'a dyn HistoryProvider,
        period: impl Into<String>,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            period: period.into(),
            interval: interval.into(),
        }
    }

    /// Fetch and store the last bar of every instrument.
    ///
    /// Every instrument in `universe` has an entry in `store` afterwards.
    pub async fn load(&self, universe: &Universe, store: &QuoteStore) -> SnapshotReport {
        let request = HistoryRequest {
            symbols: universe.symbols(),
            period: self.period.clone(),
            interval: self.interval.clone(),
        };

        tracing::info!(
            symbols = ?request.symbols,
            period = %request.period,
            interval = %request.interval,
            "Fetching initial snapshot"
        );

        let table = match self.provider.fetch_history(&request).await {
            Ok(table) if table.is_empty() => Err("empty result set".to_string()),
            Ok(table) => Ok(table),
            Err(e) => Err(e.to_string()),
        };

        let mut report = SnapshotReport::default();

        match table {
            Err(reason) => {
                tracing::error!(error = %reason, "Failed to fetch initial data");
                for instrument in universe.iter() {
                    store.mark_unavailable(&instrument.symbol);
                    report.instruments.push((
                        instrument.symbol.clone(),
                        Err(SnapshotError::Provider(reason.clone())),
                    ));
                }
                report.total_failure = Some(reason);
            }
            Ok(table) => {
                for instrument in universe.iter() {
                    let result = extract_last_bar(&table, &instrument.symbol);
                    match &result {
                        Ok(bar) => {
                            store.update(
                                &instrument.symbol,
                                Availability::Available(bar.close),
                                Availability::Available(bar.volume),
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                symbol = %instrument.symbol,
                                kind = e.kind(),
                                error = %e,
                                "Instrument unavailable in snapshot"
                            );
                            store.mark_unavailable(&instrument.symbol);
                        }
                    }
                    report.instruments.push((instrument.symbol.clone(), result));
                }
            }
        }

        metrics::record_snapshot(report.loaded(), report.unavailable());
        tracing::info!(
            loaded = report.loaded(),
            unavailable = report.unavailable(),
            "Initial snapshot applied"
        );

        report
    }
}

/// Extract the last bar with a numeric close for `symbol`.
///
/// # Errors
///
/// Returns the specific reason the instrument cannot be primed.
pub fn extract_last_bar(table: &HistoryTable, symbol: &str) -> Result<LastBar, SnapshotError> {
    if let Some(reason) = table.failure(symbol) {
        return Err(SnapshotError::Provider(reason.to_string()));
    }

    let closes = table.column(symbol, BarField::Close).ok_or(SnapshotError::NotInResult)?;

    let index = closes
        .iter()
        .rposition(|v| !v.is_null())
        .ok_or(SnapshotError::ValueMissing(BarField::Close))?;

    let close = decimal_value(&closes[index]).ok_or_else(|| SnapshotError::TypeMismatch {
        field: BarField::Close,
        found: closes[index].to_string(),
    })?;

    let volume_value = table
        .column(symbol, BarField::Volume)
        .and_then(|volumes| volumes.get(index))
        .filter(|v| !v.is_null())
        .ok_or(SnapshotError::ValueMissing(BarField::Volume))?;

    let volume = volume_u64(volume_value).ok_or_else(|| SnapshotError::TypeMismatch {
        field: BarField::Volume,
        found: volume_value.to_string(),
    })?;

    Ok(LastBar { close, volume })
}

fn decimal_value(value: &Value) -> Option<Decimal> {
    value.as_f64().filter(|f| f.is_finite()).and_then(Decimal::from_f64)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn volume_u64(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}
