//! Stream Codec Module
//!
//! Encoding and decoding for the Yahoo streamer WebSocket.
//!
//! # Frame Format
//!
//! Outbound, the client sends a JSON subscription:
//! ```json
//! {"subscribe":["BTC-USD","ETH-USD"]}
//! ```
//!
//! Inbound text frames come in two shapes depending on the endpoint version:
//! ```json
//! {"type":"pricing","message":"CgdCVEMtVVNEFQ..."}
//! ```
//! or the bare base64 string. Either way the payload is a protobuf
//! [`PricingData`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use prost::Message;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::pricing::PricingData;
use crate::domain::quote::{Availability, PriceTick, TickRejection};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is not valid base64.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Payload is not a valid protobuf message.
    #[error("protobuf decode error: {0}")]
    Protobuf(#[from] prost::DecodeError),

    /// Envelope of a kind this client does not consume.
    #[error("unsupported message type: {0}")]
    UnsupportedType(String),

    /// Empty frame.
    #[error("empty frame")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    subscribe: &'a [String],
}

/// Codec for the Yahoo streamer.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamCodec;

impl StreamCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Encode the subscription request for `symbols`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode_subscribe(&self, symbols: &[String]) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&SubscribeRequest { subscribe: symbols })?)
    }

    /// Decode one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is empty, not a pricing envelope, or its
    /// payload does not decode.
    pub fn decode(&self, text: &str) -> Result<PricingData, CodecError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CodecError::Empty);
        }

        let payload = if trimmed.starts_with('{') {
            let envelope: Envelope = serde_json::from_str(trimmed)?;
            match envelope.kind.as_deref() {
                None | Some("pricing") => envelope.message,
                Some(other) => return Err(CodecError::UnsupportedType(other.to_string())),
            }
        } else {
            trimmed.to_string()
        };

        let bytes = STANDARD.decode(payload.trim())?;
        Ok(PricingData::decode(bytes.as_slice())?)
    }

    /// Encode a payload the way the streamer sends it (bare base64).
    #[must_use]
    pub fn encode_pricing(&self, data: &PricingData) -> String {
        STANDARD.encode(data.encode_to_vec())
    }
}

/// Turn a decoded payload into a tick.
///
/// # Errors
///
/// Returns the reason the message cannot be applied.
pub fn normalize(data: PricingData) -> Result<PriceTick, TickRejection> {
    let symbol = data
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or(TickRejection::MissingSymbol)?;

    let raw = data.price.ok_or_else(|| TickRejection::MissingPrice(symbol.clone()))?;
    let price = Some(raw)
        .filter(|p| p.is_finite())
        .and_then(Decimal::from_f32)
        .ok_or_else(|| TickRejection::InvalidPrice {
            symbol: symbol.clone(),
            raw: raw.to_string(),
        })?;

    let volume = data.day_volume.and_then(|v| u64::try_from(v).ok()).into();

    Ok(PriceTick {
        symbol,
        price,
        volume,
    })
}

/// Decode a frame all the way to a tick.
///
/// The outer error means the frame was unreadable; the inner one means it
/// was readable but unusable.
///
/// # Errors
///
/// Returns [`CodecError`] when the frame cannot be decoded.
pub fn decode_tick(
    codec: &StreamCodec,
    text: &str,
) -> Result<Result<PriceTick, TickRejection>, CodecError> {
    codec.decode(text).map(normalize)
}

impl From<PriceTick> for PricingData {
    fn from(tick: PriceTick) -> Self {
        use rust_decimal::prelude::ToPrimitive;

        Self {
            id: Some(tick.symbol),
            price: tick.price.to_f32(),
            day_volume: match tick.volume {
                Availability::Available(v) => i64::try_from(v).ok(),
                Availability::Unavailable => None,
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pricing(id: Option<&str>, price: Option<f32>, volume: Option<i64>) -> PricingData {
        PricingData {
            id: id.map(str::to_string),
            price,
            day_volume: volume,
            ..PricingData::default()
        }
    }

    #[test]
    fn subscribe_frame() {
        let codec = StreamCodec::new();
        let frame = codec
            .encode_subscribe(&["BTC-USD".to_string(), "ETH-USD".to_string()])
            .unwrap();
        assert_eq!(frame, r#"{"subscribe":["BTC-USD","ETH-USD"]}"#);
    }

    #[test]
    fn decodes_bare_and_enveloped_frames() {
        let codec = StreamCodec::new();
        let data = pricing(Some("ETH-USD"), Some(2950.5), Some(1234));
        let bare = codec.encode_pricing(&data);
        let enveloped = format!(r#"{{"type":"pricing","message":"{bare}"}}"#);

        assert_eq!(codec.decode(&bare).unwrap(), data);
        assert_eq!(codec.decode(&enveloped).unwrap(), data);
    }

    #[test]
    fn rejects_garbage() {
        let codec = StreamCodec::new();
        assert!(matches!(codec.decode(""), Err(CodecError::Empty)));
        assert!(matches!(codec.decode("!!not base64!!"), Err(CodecError::Base64(_))));
        assert!(matches!(codec.decode("{not json"), Err(CodecError::Json(_))));
        assert!(matches!(
            codec.decode(r#"{"type":"heartbeat","message":""}"#),
            Err(CodecError::UnsupportedType(_))
        ));
        // Valid base64, invalid protobuf (truncated length-delimited field).
        assert!(matches!(
            codec.decode(&STANDARD.encode([0x0a, 0x10, 0x41])),
            Err(CodecError::Protobuf(_))
        ));
    }

    #[test]
    fn normalize_full_message() {
        let tick = normalize(pricing(Some("BTC-USD"), Some(100_050.0), Some(500))).unwrap();
        assert_eq!(tick.symbol, "BTC-USD");
        assert_eq!(tick.price, dec!(100050));
        assert_eq!(tick.volume, Availability::Available(500));
    }

    #[test]
    fn absent_volume_is_unavailable_not_zero() {
        let absent = normalize(pricing(Some("ETH-USD"), Some(3000.0), None)).unwrap();
        let zero = normalize(pricing(Some("ETH-USD"), Some(3000.0), Some(0))).unwrap();
        assert_eq!(absent.volume, Availability::Unavailable);
        assert_eq!(zero.volume, Availability::Available(0));
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert_eq!(normalize(pricing(None, Some(1.0), None)), Err(TickRejection::MissingSymbol));
        assert_eq!(
            normalize(pricing(Some(" "), Some(1.0), None)),
            Err(TickRejection::MissingSymbol)
        );
        assert_eq!(
            normalize(pricing(Some("BTC-USD"), None, Some(1))),
            Err(TickRejection::MissingPrice("BTC-USD".to_string()))
        );
        assert!(matches!(
            normalize(pricing(Some("BTC-USD"), Some(f32::NAN), None)),
            Err(TickRejection::InvalidPrice { .. })
        ));
    }

    #[test]
    fn decode_tick_separates_unreadable_from_unusable() {
        let codec = StreamCodec::new();
        assert!(decode_tick(&codec, "%%%").is_err());

        let frame = codec.encode_pricing(&pricing(Some("BTC-USD"), None, None));
        assert!(matches!(decode_tick(&codec, &frame), Ok(Err(TickRejection::MissingPrice(_)))));
    }
}
