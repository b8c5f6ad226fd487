//! Streamer Client Tests
//!
//! Runs the streamer client against an in-process WebSocket server that
//! speaks the pricing protocol.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rust_decimal_macros::dec;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use quote_dashboard::infrastructure::yahoo::{PricingData, StreamCodec};
use quote_dashboard::{
    Availability, FeedEvent, FeedState, FeedStatus, PriceTick, QuoteStore, StreamIngestor,
    StreamerClient, StreamerClientConfig, TickRejection, Universe, WebSocketSettings,
};

// =============================================================================
// Test Server
// =============================================================================

/// Accept one connection, report the subscribe frame, push `frames`, then
/// hold the connection open until the client closes it.
async fn start_server(frames: Vec<String>) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (subscribe_tx, subscribe_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let _ = subscribe_tx.send(text.to_string());
        }

        for frame in frames {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }

        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });

    (addr, subscribe_rx)
}

/// Serve one session per entry in `sessions`. Each session reports its
/// subscribe frame, pushes its frames and then closes the connection, except
/// the last one, which stays open until the client closes it.
async fn start_reconnecting_server(
    sessions: Vec<Vec<String>>,
) -> (SocketAddr, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (subscribe_tx, subscribe_rx) = mpsc::channel(sessions.len().max(1));

    tokio::spawn(async move {
        let last = sessions.len().saturating_sub(1);
        for (index, frames) in sessions.into_iter().enumerate() {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            if let Some(Ok(Message::Text(text))) = ws.next().await {
                let _ = subscribe_tx.send(text.to_string()).await;
            }
            for frame in frames {
                ws.send(Message::Text(frame.into())).await.unwrap();
            }

            if index == last {
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_close() {
                        break;
                    }
                }
            } else {
                let _ = ws.close(None).await;
            }
        }
    });

    (addr, subscribe_rx)
}

fn client_for(
    addr: SocketAddr,
    tx: mpsc::Sender<FeedEvent>,
    cancel: CancellationToken,
) -> Arc<StreamerClient> {
    let settings = WebSocketSettings {
        url: format!("ws://{addr}"),
        reconnect_delay_initial: Duration::from_millis(10),
        reconnect_delay_max: Duration::from_millis(50),
        max_reconnect_attempts: 1,
        ..WebSocketSettings::default()
    };
    let symbols = vec!["BTC-USD".to_string(), "ETH-USD".to_string()];
    Arc::new(StreamerClient::new(
        StreamerClientConfig::from_settings(&settings, symbols),
        tx,
        cancel,
    ))
}

fn pricing_frame(symbol: &str, price: rust_decimal::Decimal, volume: u64) -> String {
    let data = PricingData::from(PriceTick {
        symbol: symbol.to_string(),
        price,
        volume: Availability::Available(volume),
    });
    StreamCodec::new().encode_pricing(&data)
}

async fn next_event(rx: &mut mpsc::Receiver<FeedEvent>) -> FeedEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for feed event")
        .expect("feed channel closed")
}

/// Receive the next event and apply it, as the ingestion task would.
async fn next_applied(rx: &mut mpsc::Receiver<FeedEvent>, ingestor: &StreamIngestor) -> FeedEvent {
    let event = next_event(rx).await;
    ingestor.handle(event.clone());
    event
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn subscribes_and_forwards_ticks() {
    let enveloped = format!(
        r#"{{"type":"pricing","message":"{}"}}"#,
        pricing_frame("ETH-USD", dec!(2950), 12)
    );
    let (addr, subscribe_rx) =
        start_server(vec![pricing_frame("BTC-USD", dec!(100050), 500), enveloped]).await;

    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(client_for(addr, tx, cancel.clone()).run());

    let subscribe = tokio::time::timeout(Duration::from_secs(5), subscribe_rx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscribe, r#"{"subscribe":["BTC-USD","ETH-USD"]}"#);

    assert!(matches!(next_event(&mut rx).await, FeedEvent::Subscribing));
    match next_event(&mut rx).await {
        FeedEvent::Tick(tick) => {
            assert_eq!(tick.symbol, "BTC-USD");
            assert_eq!(tick.price, dec!(100050));
            assert_eq!(tick.volume, Availability::Available(500));
        }
        other => panic!("expected tick, got {other:?}"),
    }
    match next_event(&mut rx).await {
        FeedEvent::Tick(tick) => assert_eq!(tick.symbol, "ETH-USD"),
        other => panic!("expected tick, got {other:?}"),
    }

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn bad_frames_are_reported_not_fatal() {
    let no_price = StreamCodec::new().encode_pricing(&PricingData {
        id: Some("BTC-USD".to_string()),
        ..PricingData::default()
    });
    let (addr, _subscribe_rx) = start_server(vec![
        "%%% not base64 %%%".to_string(),
        no_price,
        pricing_frame("BTC-USD", dec!(100001), 1),
    ])
    .await;

    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(client_for(addr, tx, cancel.clone()).run());

    assert!(matches!(next_event(&mut rx).await, FeedEvent::Subscribing));
    assert!(matches!(next_event(&mut rx).await, FeedEvent::Malformed(_)));
    assert!(matches!(
        next_event(&mut rx).await,
        FeedEvent::Rejected(TickRejection::MissingPrice(symbol)) if symbol == "BTC-USD"
    ));
    assert!(matches!(next_event(&mut rx).await, FeedEvent::Tick(_)));

    cancel.cancel();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn feed_into_store_end_to_end() {
    let (addr, _subscribe_rx) = start_server(vec![
        pricing_frame("ETH-USD", dec!(3000), 10),
        pricing_frame("ETH-USD", dec!(2950), 11),
    ])
    .await;

    let store = Arc::new(QuoteStore::new());
    let feed = Arc::new(FeedStatus::new());
    let ingestor = StreamIngestor::new(
        Arc::clone(&store),
        Arc::new(Universe::default()),
        Arc::clone(&feed),
    );

    let (tx, rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let client = tokio::spawn(client_for(addr, tx, cancel.clone()).run());
    let ingest = tokio::spawn(ingestor.run(rx));

    tokio::time::timeout(Duration::from_secs(5), async {
        while feed.ticks_applied() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let eth = store.get("ETH-USD").unwrap();
    assert_eq!(eth.latest.price, Availability::Available(dec!(2950)));
    assert_eq!(eth.previous_price, Some(Availability::Available(dec!(3000))));
    assert_eq!(feed.state(), FeedState::Streaming);

    cancel.cancel();
    client.await.unwrap().unwrap();
    tokio::time::timeout(Duration::from_secs(5), ingest).await.unwrap().unwrap();
    assert_eq!(feed.state(), FeedState::Stopped);
}

#[tokio::test]
async fn resubscribes_after_server_drops_connection() {
    let (addr, mut subscribes) = start_reconnecting_server(vec![
        vec![pricing_frame("BTC-USD", dec!(100050), 500)],
        vec![pricing_frame("ETH-USD", dec!(2950), 12)],
    ])
    .await;

    let store = Arc::new(QuoteStore::new());
    let feed = Arc::new(FeedStatus::new());
    let ingestor = StreamIngestor::new(
        Arc::clone(&store),
        Arc::new(Universe::default()),
        Arc::clone(&feed),
    );

    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(client_for(addr, tx, cancel.clone()).run());

    assert_eq!(next_applied(&mut rx, &ingestor).await, FeedEvent::Subscribing);
    assert!(matches!(
        next_applied(&mut rx, &ingestor).await,
        FeedEvent::Tick(tick) if tick.symbol == "BTC-USD"
    ));
    assert_eq!(feed.state(), FeedState::Streaming);

    assert_eq!(next_applied(&mut rx, &ingestor).await, FeedEvent::Disconnected);
    assert_eq!(feed.state(), FeedState::Disconnected);
    assert_eq!(next_applied(&mut rx, &ingestor).await, FeedEvent::Reconnecting { attempt: 1 });
    assert_eq!(feed.reconnect_attempts(), 1);

    // Last known value survives the outage.
    assert_eq!(
        store.get("BTC-USD").unwrap().latest.price,
        Availability::Available(dec!(100050))
    );

    assert_eq!(next_applied(&mut rx, &ingestor).await, FeedEvent::Subscribing);
    assert!(matches!(
        next_applied(&mut rx, &ingestor).await,
        FeedEvent::Tick(tick) if tick.symbol == "ETH-USD"
    ));
    assert_eq!(feed.state(), FeedState::Streaming);
    assert_eq!(feed.reconnect_attempts(), 0);

    let expected = r#"{"subscribe":["BTC-USD","ETH-USD"]}"#;
    assert_eq!(subscribes.recv().await.unwrap(), expected);
    assert_eq!(subscribes.recv().await.unwrap(), expected);

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
}
