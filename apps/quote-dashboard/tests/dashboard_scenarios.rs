//! Dashboard Scenario Tests
//!
//! Drives the loader, ingestor and render pipeline together with a fake
//! history provider and an in-memory display surface.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveTime;
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use quote_dashboard::application::services::render::{Direction, GainTone};
use quote_dashboard::{
    Availability, BarField, DisplaySurface, FeedEvent, FeedState, FeedStatus, HistoryProvider,
    HistoryRequest, HistoryTable, IngestionTasks, PriceTick, ProviderError, QuoteStore,
    RenderContext, RenderFrame, ShutdownOutcome, SnapshotLoader, StreamIngestor, TickRejection,
    Universe, build_frame, run_render_loop,
};

// =============================================================================
// Fakes
// =============================================================================

struct FakeProvider {
    table: Option<HistoryTable>,
    requests: Mutex<Vec<HistoryRequest>>,
}

impl FakeProvider {
    fn with_table(table: HistoryTable) -> Self {
        Self {
            table: Some(table),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            table: None,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HistoryProvider for FakeProvider {
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<HistoryTable, ProviderError> {
        self.requests.lock().push(request.clone());
        self.table
            .clone()
            .ok_or_else(|| ProviderError::Decode("connection refused".to_string()))
    }
}

#[derive(Default)]
struct RecordingSurface {
    frames: Vec<RenderFrame>,
}

impl DisplaySurface for RecordingSurface {
    fn present(&mut self, frame: &RenderFrame) -> std::io::Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

fn series(table: &mut HistoryTable, symbol: &str, closes: Vec<Value>, volumes: Vec<Value>) {
    table.insert_column(symbol, BarField::Close, closes);
    table.insert_column(symbol, BarField::Volume, volumes);
}

fn tick(symbol: &str, price: rust_decimal::Decimal) -> FeedEvent {
    FeedEvent::Tick(PriceTick {
        symbol: symbol.to_string(),
        price,
        volume: Availability::Available(1),
    })
}

fn frame_at(universe: &Universe, store: &QuoteStore) -> RenderFrame {
    build_frame(
        universe,
        &store.snapshot(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        FeedState::Streaming,
    )
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn snapshot_with_missing_instrument() {
    let mut table = HistoryTable::new();
    series(
        &mut table,
        "BTC-USD",
        vec![json!(99_990.0), json!(100_050.0)],
        vec![json!(7), json!(500)],
    );
    let provider = FakeProvider::with_table(table);

    let universe = Universe::default();
    let store = QuoteStore::new();
    let report = SnapshotLoader::new(&provider, "1d", "1m").load(&universe, &store).await;

    assert_eq!(report.loaded(), 1);
    assert_eq!(report.unavailable(), 1);
    assert!(report.total_failure.is_none());

    let requests = provider.requests.lock();
    assert_eq!(requests[0].symbols, ["BTC-USD", "ETH-USD"]);
    assert_eq!(requests[0].period, "1d");
    drop(requests);

    let btc = store.get("BTC-USD").unwrap();
    assert_eq!(btc.latest.price, Availability::Available(dec!(100050)));
    assert_eq!(btc.latest.volume, Availability::Available(500));
    assert_eq!(btc.previous_price, None);

    let eth = store.get("ETH-USD").unwrap();
    assert_eq!(eth.latest.price, Availability::Unavailable);

    let frame = frame_at(&universe, &store);
    assert_eq!(frame.rows[0].price.text, "$ 100050.00");
    assert_eq!(frame.rows[0].price.direction, Direction::Neutral);
    assert_eq!(frame.rows[0].gain.text, "+50.00");
    assert_eq!(frame.rows[0].gain.tone, GainTone::Positive);
    assert_eq!(frame.rows[1].price.text, "N/A");
    assert_eq!(frame.rows[1].volume, "N/A");
}

#[tokio::test]
async fn total_provider_failure_marks_everything_unavailable() {
    let provider = FakeProvider::failing();
    let universe = Universe::default();
    let store = QuoteStore::new();

    let report = SnapshotLoader::new(&provider, "1d", "1m").load(&universe, &store).await;

    assert!(report.total_failure.is_some());
    assert_eq!(report.unavailable(), 2);
    for instrument in universe.iter() {
        assert_eq!(store.get(&instrument.symbol).unwrap().latest.price, Availability::Unavailable);
    }

    let frame = frame_at(&universe, &store);
    assert!(frame.rows.iter().all(|row| row.price.text == "N/A"));
}

#[tokio::test]
async fn empty_result_counts_as_total_failure() {
    let provider = FakeProvider::with_table(HistoryTable::new());
    let store = QuoteStore::new();

    let report = SnapshotLoader::new(&provider, "1d", "1m")
        .load(&Universe::default(), &store)
        .await;

    assert!(report.total_failure.is_some());
    assert_eq!(store.len(), 2);
}

#[test]
fn stream_drop_renders_down() {
    let universe = Arc::new(Universe::default());
    let store = Arc::new(QuoteStore::new());
    let ingestor =
        StreamIngestor::new(Arc::clone(&store), Arc::clone(&universe), Arc::new(FeedStatus::new()));

    ingestor.handle(tick("ETH-USD", dec!(3000)));
    ingestor.handle(tick("ETH-USD", dec!(2950)));

    let frame = frame_at(&universe, &store);
    assert_eq!(frame.rows[1].price.text, "$ 2950.00");
    assert_eq!(frame.rows[1].price.direction, Direction::Down);
    assert_eq!(frame.rows[1].gain.text, "±0");
    assert_eq!(frame.rows[1].gain.tone, GainTone::Untracked);

    // Direction persists across frames until the next update.
    let again = frame_at(&universe, &store);
    assert_eq!(again.rows[1].price.direction, Direction::Down);
}

#[test]
fn malformed_push_message_leaves_store_unchanged() {
    let universe = Arc::new(Universe::default());
    let store = Arc::new(QuoteStore::new());
    let feed = Arc::new(FeedStatus::new());
    let ingestor = StreamIngestor::new(Arc::clone(&store), universe, Arc::clone(&feed));

    ingestor.handle(tick("BTC-USD", dec!(100050)));
    let before = store.snapshot();

    ingestor.handle(FeedEvent::Malformed("invalid base64".to_string()));
    ingestor.handle(FeedEvent::Rejected(TickRejection::MissingSymbol));
    ingestor.handle(FeedEvent::Rejected(TickRejection::MissingPrice("BTC-USD".to_string())));

    assert_eq!(store.snapshot(), before);
    assert_eq!(feed.ticks_dropped(), 3);
}

#[tokio::test(start_paused = true)]
async fn interrupt_mid_sleep_stops_rendering_and_ingestion() {
    let universe = Arc::new(Universe::default());
    let store = Arc::new(QuoteStore::new());
    let feed = Arc::new(FeedStatus::new());
    let cancel = CancellationToken::new();

    // Stand-in for the streamer client: ticks until cancelled.
    let (tx, rx) = mpsc::channel(16);
    let producer_cancel = cancel.clone();
    let producer = tokio::spawn(async move {
        let _ = tx.send(FeedEvent::Subscribing).await;
        let mut price = dec!(3000);
        loop {
            tokio::select! {
                () = producer_cancel.cancelled() => break,
                () = tokio::time::sleep(Duration::from_millis(40)) => {
                    price += dec!(1);
                    let _ = tx.send(tick("ETH-USD", price)).await;
                }
            }
        }
    });

    let mut tasks = IngestionTasks::new();
    tasks.push("producer", producer);
    let ingestor =
        StreamIngestor::new(Arc::clone(&store), Arc::clone(&universe), Arc::clone(&feed));
    tasks.push("ingestor", tokio::spawn(ingestor.run(rx)));

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(600)).await;
        trigger.cancel();
    });

    let ctx = RenderContext {
        universe,
        store: Arc::clone(&store),
        feed: Arc::clone(&feed),
    };
    let mut surface = RecordingSurface::default();
    let frames = run_render_loop(&ctx, &mut surface, Duration::from_millis(250), cancel).await;

    // Frames at 0, 250 and 500 ms; the cancel at 600 ms lands mid-sleep.
    assert_eq!(frames, 3);
    assert_eq!(surface.frames.len(), 3);
    assert_eq!(surface.frames[2].rows[1].price.direction, Direction::Up);

    assert_eq!(tasks.stop(Duration::from_secs(1)).await, ShutdownOutcome::Completed);
    assert_eq!(feed.state(), FeedState::Stopped);

    let frozen = store.snapshot();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.snapshot(), frozen);
}
