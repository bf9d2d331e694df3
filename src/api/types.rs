//! Wire types for the exchange REST API.

use rust_decimal::Decimal;
use serde::Deserialize;

/// One kline row as returned by `/fapi/v1/klines`: a 12-element JSON array
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume,
/// trades, takerBase, takerQuote, ignore]` with numerics encoded as strings.
pub type RawKline = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    i64,
    String,
    String,
    String,
);

/// Response from `/fapi/v1/ticker/price`.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// One entry from `/fapi/v2/balance`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBalance {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
}

/// One entry from `/fapi/v2/positionRisk`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRisk {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub position_amt: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub entry_price: Decimal,
}

/// Acknowledgement from `POST /fapi/v1/order`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: i64,
    pub status: String,
    #[serde(default)]
    pub client_order_id: Option<String>,
}

/// Acknowledgement from `POST /fapi/v1/leverage`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageAck {
    pub symbol: String,
    pub leverage: u32,
}

/// Error body the exchange returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}
