//! Yahoo streamer payload.
//!
//! Protobuf message carried (base64 encoded) in every streamer frame. Fields
//! are declared `optional` so that an omitted price or volume stays
//! distinguishable from zero.

/// Market hours reported with a price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MarketHours {
    /// Before the regular session.
    PreMarket = 0,
    /// Regular session.
    RegularMarket = 1,
    /// After the regular session.
    PostMarket = 2,
    /// Extended hours.
    ExtendedHoursMarket = 3,
}

/// One price update.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PricingData {
    /// Instrument identifier.
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    /// Last price.
    #[prost(float, optional, tag = "2")]
    pub price: Option<f32>,
    /// Exchange timestamp, epoch milliseconds.
    #[prost(sint64, optional, tag = "3")]
    pub time: Option<i64>,
    /// Quote currency.
    #[prost(string, optional, tag = "4")]
    pub currency: Option<String>,
    /// Exchange code.
    #[prost(string, optional, tag = "5")]
    pub exchange: Option<String>,
    /// Instrument type code.
    #[prost(int32, optional, tag = "6")]
    pub quote_type: Option<i32>,
    /// Session the price belongs to.
    #[prost(enumeration = "MarketHours", optional, tag = "7")]
    pub market_hours: Option<i32>,
    /// Change since previous close, percent.
    #[prost(float, optional, tag = "8")]
    pub change_percent: Option<f32>,
    /// Cumulative volume for the day.
    #[prost(sint64, optional, tag = "9")]
    pub day_volume: Option<i64>,
    /// Session high.
    #[prost(float, optional, tag = "10")]
    pub day_high: Option<f32>,
    /// Session low.
    #[prost(float, optional, tag = "11")]
    pub day_low: Option<f32>,
    /// Change since previous close, absolute.
    #[prost(float, optional, tag = "12")]
    pub change: Option<f32>,
    /// Display name.
    #[prost(string, optional, tag = "13")]
    pub short_name: Option<String>,
}
