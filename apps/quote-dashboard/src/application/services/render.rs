//! Render Pipeline
//!
//! Pure projection of a quote snapshot onto a displayable frame. No I/O, no
//! clock reads: the caller passes the time in, so every frame is a function
//! of its inputs alone.

use chrono::NaiveTime;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::feed::FeedState;
use crate::domain::instrument::Universe;
use crate::domain::quote::{Availability, QuoteEntry, QuoteSnapshot, Symbol};

/// Marker shown for any value that is unavailable or never observed.
pub const UNAVAILABLE_MARKER: &str = "N/A";

/// Marker shown when no gain is tracked or the gain is exactly zero.
pub const NO_GAIN_MARKER: &str = "±0";

/// Footer clock format.
pub const CLOCK_FORMAT: &str = "%H:%M:%S";

// =============================================================================
// Tones
// =============================================================================

/// Direction of the last price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Latest price above the previous one.
    Up,
    /// Latest price below the previous one.
    Down,
    /// Equal, or either side not a number.
    Neutral,
}

/// Tone of the gain cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainTone {
    /// Price above book value.
    Positive,
    /// Price below book value.
    Negative,
    /// Price exactly at book value.
    Zero,
    /// No book value, or no price to compare.
    Untracked,
}

// =============================================================================
// Frame
// =============================================================================

/// Price cell text and its tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceCell {
    /// Display text.
    pub text: String,
    /// Colour selector.
    pub direction: Direction,
}

/// Gain cell text and its tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GainCell {
    /// Display text.
    pub text: String,
    /// Colour selector.
    pub tone: GainTone,
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRow {
    /// Instrument identifier.
    pub symbol: Symbol,
    /// Price column.
    pub price: PriceCell,
    /// Volume column.
    pub volume: String,
    /// Gain column.
    pub gain: GainCell,
}

/// A complete, immutable frame ready for a display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    /// Rows in universe order.
    pub rows: Vec<FrameRow>,
    /// Footer clock, `HH:MM:SS`.
    pub clock: String,
    /// Feed state shown in the footer.
    pub feed: FeedState,
}

// =============================================================================
// Projection
// =============================================================================

/// Direction of the move from `previous` to `latest`.
#[must_use]
pub fn direction(
    latest: Availability<Decimal>,
    previous: Option<Availability<Decimal>>,
) -> Direction {
    match (latest, previous) {
        (Availability::Available(now), Some(Availability::Available(before))) => {
            match now.cmp(&before) {
                std::cmp::Ordering::Greater => Direction::Up,
                std::cmp::Ordering::Less => Direction::Down,
                std::cmp::Ordering::Equal => Direction::Neutral,
            }
        }
        _ => Direction::Neutral,
    }
}

/// Gain of `price` over `book_value`.
///
/// The tone follows the delta rounded to cents, so a sub-cent gain reads as
/// zero rather than `+0.00`.
#[must_use]
pub fn gain(price: Availability<Decimal>, book_value: Option<Decimal>) -> GainCell {
    let (Some(price), Some(book)) = (price.available(), book_value) else {
        return GainCell {
            text: NO_GAIN_MARKER.to_string(),
            tone: GainTone::Untracked,
        };
    };

    let delta = (price - book).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if delta.is_zero() {
        GainCell {
            text: NO_GAIN_MARKER.to_string(),
            tone: GainTone::Zero,
        }
    } else if delta.is_sign_positive() {
        GainCell {
            text: format!("+{delta:.2}"),
            tone: GainTone::Positive,
        }
    } else {
        GainCell {
            text: format!("{delta:.2}"),
            tone: GainTone::Negative,
        }
    }
}

fn price_cell(entry: Option<&QuoteEntry>) -> PriceCell {
    let Some(entry) = entry else {
        return PriceCell {
            text: UNAVAILABLE_MARKER.to_string(),
            direction: Direction::Neutral,
        };
    };

    let text = match entry.latest.price {
        Availability::Available(price) => format!("$ {price:.2}"),
        Availability::Unavailable => UNAVAILABLE_MARKER.to_string(),
    };

    PriceCell {
        text,
        direction: direction(entry.latest.price, entry.previous_price),
    }
}

fn volume_text(entry: Option<&QuoteEntry>) -> String {
    match entry.map(|e| e.latest.volume) {
        Some(Availability::Available(volume)) => volume.to_string(),
        _ => UNAVAILABLE_MARKER.to_string(),
    }
}

/// Build the frame for `snapshot` at time `now`.
#[must_use]
pub fn build_frame(
    universe: &Universe,
    snapshot: &QuoteSnapshot,
    now: NaiveTime,
    feed: FeedState,
) -> RenderFrame {
    let rows = universe
        .iter()
        .map(|instrument| {
            let entry = snapshot.get(&instrument.symbol);
            let latest_price = entry.map_or(Availability::Unavailable, |e| e.latest.price);
            FrameRow {
                symbol: instrument.symbol.clone(),
                price: price_cell(entry),
                volume: volume_text(entry),
                gain: gain(latest_price, instrument.book_value),
            }
        })
        .collect();

    RenderFrame {
        rows,
        clock: now.format(CLOCK_FORMAT).to_string(),
        feed,
    }
}
