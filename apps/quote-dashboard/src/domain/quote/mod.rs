//! Quote State
//!
//! Domain types for the latest known state of each instrument and the store
//! that holds it.
//!
//! # Design
//!
//! The store keeps, per instrument:
//! - The latest `Observation` (price and volume, each possibly unavailable)
//! - The price that was latest immediately before the current observation
//!
//! Keeping exactly one step of history lets the render pipeline derive the
//! direction of the last move without storing a price series.

use std::collections::HashMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;

// =============================================================================
// Types
// =============================================================================

/// An instrument identifier as used by the market data provider (e.g. `BTC-USD`).
pub type Symbol = String;

/// A value that was either observed or explicitly reported as unavailable.
///
/// Deliberately not `PartialOrd`: an unavailable price must never compare
/// against a real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability<T> {
    /// The provider supplied a usable value.
    Available(T),
    /// The value could not be obtained.
    Unavailable,
}

impl<T> Availability<T> {
    /// Convert into an `Option`, dropping the unavailable marker.
    #[must_use]
    pub fn available(self) -> Option<T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable => None,
        }
    }
}

impl<T> From<Option<T>> for Availability<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unavailable, Self::Available)
    }
}

/// Latest known price and volume for one instrument.
///
/// Replaced wholesale on every update, never patched field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Last traded or closing price.
    pub price: Availability<Decimal>,
    /// Volume reported alongside the price.
    pub volume: Availability<u64>,
}

impl Observation {
    /// Create a new observation.
    #[must_use]
    pub const fn new(price: Availability<Decimal>, volume: Availability<u64>) -> Self {
        Self { price, volume }
    }

    /// An observation where neither field could be obtained.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            price: Availability::Unavailable,
            volume: Availability::Unavailable,
        }
    }
}

/// Stored state for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteEntry {
    /// The most recent observation.
    pub latest: Observation,
    /// Price of the observation that preceded `latest`.
    ///
    /// `None` until a second observation arrives.
    pub previous_price: Option<Availability<Decimal>>,
}

// =============================================================================
// Push Feed Ticks
// =============================================================================

/// A normalized price update from the push feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTick {
    /// Instrument identifier.
    pub symbol: Symbol,
    /// Traded price.
    pub price: Decimal,
    /// Day volume; unavailable when the message omitted it.
    pub volume: Availability<u64>,
}

/// Reasons a push message is dropped without touching the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickRejection {
    /// Message carried no instrument identifier.
    #[error("message has no instrument identifier")]
    MissingSymbol,
    /// Message carried no price.
    #[error("message for {0} has no price")]
    MissingPrice(Symbol),
    /// Price was present but not a finite number.
    #[error("message for {symbol} has invalid price {raw}")]
    InvalidPrice {
        /// Instrument identifier.
        symbol: Symbol,
        /// Raw value as received.
        raw: String,
    },
    /// Identifier is not part of the configured universe.
    #[error("message for unconfigured instrument {0}")]
    UnknownSymbol(Symbol),
}

impl TickRejection {
    /// Short label used for metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingSymbol => "missing_symbol",
            Self::MissingPrice(_) => "missing_price",
            Self::InvalidPrice { .. } => "invalid_price",
            Self::UnknownSymbol(_) => "unknown_symbol",
        }
    }
}

// =============================================================================
// Quote Store
// =============================================================================

/// Point-in-time copy of the store, used to build one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteSnapshot {
    entries: HashMap<Symbol, QuoteEntry>,
}

impl QuoteSnapshot {
    /// Look up the entry for an instrument.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&QuoteEntry> {
        self.entries.get(symbol)
    }

    /// Number of instruments ever observed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &QuoteEntry)> {
        self.entries.iter()
    }
}

/// Shared store of the latest observation per instrument.
///
/// All mutation goes through [`QuoteStore::update`], which holds the write
/// lock for the whole read-previous / write-latest sequence, so a concurrent
/// [`QuoteStore::snapshot`] never sees one half of an update.
#[derive(Debug, Default)]
pub struct QuoteStore {
    entries: RwLock<HashMap<Symbol, QuoteEntry>>,
}

impl QuoteStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new observation for `symbol`.
    ///
    /// The price that was latest before this call becomes the previous price.
    /// Returns the entry as stored.
    pub fn update(
        &self,
        symbol: &str,
        price: Availability<Decimal>,
        volume: Availability<u64>,
    ) -> QuoteEntry {
        let observation = Observation::new(price, volume);
        let mut entries = self.entries.write();

        let previous_price = entries.get(symbol).map(|entry| entry.latest.price);
        let entry = QuoteEntry {
            latest: observation,
            previous_price,
        };
        entries.insert(symbol.to_string(), entry);
        entry
    }

    /// Apply a normalized push feed tick.
    pub fn apply_tick(&self, tick: &PriceTick) -> QuoteEntry {
        self.update(&tick.symbol, Availability::Available(tick.price), tick.volume)
    }

    /// Mark an instrument as observed but unavailable.
    pub fn mark_unavailable(&self, symbol: &str) -> QuoteEntry {
        self.update(symbol, Availability::Unavailable, Availability::Unavailable)
    }

    /// Take a consistent copy of every entry.
    #[must_use]
    pub fn snapshot(&self) -> QuoteSnapshot {
        QuoteSnapshot {
            entries: self.entries.read().clone(),
        }
    }

    /// Get the entry for a single instrument.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<QuoteEntry> {
        self.entries.read().get(symbol).copied()
    }

    /// Number of instruments ever observed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if nothing has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
