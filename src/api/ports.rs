//! Abstract exchange capabilities consumed by the strategy engine.
//!
//! The engine never talks to the exchange directly; it is generic over these
//! three ports so the state machine can be exercised against in-memory fakes.
//! All implementations must tolerate concurrent use: several engines share
//! one adapter.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{CandleInterval, CandleWindow};

/// Order side as the exchange understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

/// Broker-reported position for a symbol. A signed `amount`: positive is
/// long, negative is short, zero is flat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrokerPosition {
    pub amount: Decimal,
    pub entry_price: Decimal,
}

/// Recent candles and the live ticker price. Fails with `DataUnavailable`.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: u32,
    ) -> Result<CandleWindow>;

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal>;
}

/// Wallet balance and current position. Fails with `AccountUnavailable`.
#[async_trait]
pub trait Account: Send + Sync {
    async fn fetch_balance(&self) -> Result<Decimal>;

    async fn fetch_position(&self, symbol: &str) -> Result<BrokerPosition>;
}

/// Leverage changes and market-order submission. Fails with `OrderRejected`.
///
/// Leverage is a per-symbol global on the exchange: two engines trading the
/// same symbol at different leverages will overwrite each other. Documented
/// limitation, not resolved here.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()>;

    async fn submit_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        client_order_id: &str,
    ) -> Result<()>;
}
