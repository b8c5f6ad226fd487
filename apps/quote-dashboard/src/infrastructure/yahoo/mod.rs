//! Yahoo Finance Adapters
//!
//! - **Chart API**: bulk history for the initial snapshot (HTTPS, JSON)
//! - **Streamer**: push price updates (WebSocket, base64 protobuf)

pub mod chart;
pub mod codec;
pub mod heartbeat;
pub mod pricing;
pub mod reconnect;
pub mod streamer;

pub use chart::YahooChartClient;
pub use codec::{CodecError, StreamCodec, decode_tick, normalize};
pub use heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
pub use pricing::{MarketHours, PricingData};
pub use reconnect::{ReconnectConfig, ReconnectError, ReconnectPolicy};
pub use streamer::{StreamClientError, StreamerClient, StreamerClientConfig};
