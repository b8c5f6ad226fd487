//! Instrument Universe
//!
//! The fixed set of instruments the dashboard tracks, with optional book
//! values used for unrealized gain.

use rust_decimal::Decimal;

use super::quote::Symbol;

/// A tracked instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// Provider identifier (e.g. `BTC-USD`).
    pub symbol: Symbol,
    /// Reference price for gain tracking; `None` disables the gain column.
    pub book_value: Option<Decimal>,
}

impl Instrument {
    /// Create an instrument with a book value.
    #[must_use]
    pub fn with_book_value(symbol: impl Into<Symbol>, book_value: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            book_value: Some(book_value),
        }
    }

    /// Create an instrument without gain tracking.
    #[must_use]
    pub fn untracked(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            book_value: None,
        }
    }
}

/// Ordered list of instruments. Order is the display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    instruments: Vec<Instrument>,
}

impl Default for Universe {
    /// The built-in universe: Bitcoin with a 100 000 book value, Ether untracked.
    fn default() -> Self {
        Self::new(vec![
            Instrument::with_book_value("BTC-USD", Decimal::from(100_000)),
            Instrument::untracked("ETH-USD"),
        ])
    }
}

impl Universe {
    /// Create a universe in the given display order.
    ///
    /// Later duplicates of a symbol are dropped.
    #[must_use]
    pub fn new(instruments: Vec<Instrument>) -> Self {
        let mut unique: Vec<Instrument> = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            if !unique.iter().any(|i| i.symbol == instrument.symbol) {
                unique.push(instrument);
            }
        }
        Self { instruments: unique }
    }

    /// Iterate in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    /// Symbols in display order.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.instruments.iter().map(|i| i.symbol.clone()).collect()
    }

    /// Check if a symbol belongs to the universe.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.instruments.iter().any(|i| i.symbol == symbol)
    }

    /// Number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Check if the universe is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
