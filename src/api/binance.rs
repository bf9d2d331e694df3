//! Binance USDT-M futures REST adapter implementing the three exchange ports.
//!
//! Signed endpoints use the exchange's HMAC-SHA256 query signature; read-only
//! market data endpoints are unauthenticated. One instance is shared (cloned)
//! across all strategy engines; `reqwest::Client` handles connection reuse.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::debug;

use crate::error::{BotError, Result};
use crate::models::{Candle, CandleInterval, CandleWindow};

use super::ports::{Account, BrokerPosition, MarketData, OrderGateway, OrderSide};
use super::types::{ApiErrorBody, AssetBalance, LeverageAck, OrderAck, PositionRisk, RawKline};

const FAPI_BASE: &str = "https://fapi.binance.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const RECV_WINDOW_MS: u64 = 5000;

/// Margin asset all strategies are denominated in.
const QUOTE_ASSET: &str = "USDT";

/// Futures REST client. Cheap to clone; engines each hold a clone.
#[derive(Clone)]
pub struct BinanceFutures {
    http: Client,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl BinanceFutures {
    /// Build a client from `BINANCE_API_KEY` / `BINANCE_API_SECRET`.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("BINANCE_API_KEY")
            .map_err(|_| anyhow::anyhow!("BINANCE_API_KEY not set"))?;
        let api_secret = std::env::var("BINANCE_API_SECRET")
            .map_err(|_| anyhow::anyhow!("BINANCE_API_SECRET not set"))?;
        Self::with_credentials(api_key, api_secret)
    }

    /// Build an unauthenticated client. Only the public market data
    /// endpoints work without credentials.
    pub fn public() -> anyhow::Result<Self> {
        Self::with_credentials(String::new(), String::new())
    }

    pub fn with_credentials(api_key: String, api_secret: String) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key,
            api_secret,
            base_url: FAPI_BASE.to_string(),
        })
    }

    /// Point the client at a different base URL (for testing).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn sign(&self, query: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .expect("hmac accepts keys of any length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn signed_url(&self, path: &str, mut params: Vec<String>) -> String {
        params.push(format!("timestamp={}", Utc::now().timestamp_millis()));
        params.push(format!("recvWindow={RECV_WINDOW_MS}"));
        let query = params.join("&");
        let signature = self.sign(&query);
        format!("{}{}?{}&signature={}", self.base_url, path, query, signature)
    }

    async fn get_public<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<T> {
        let url = format!("{}{}?{}", self.base_url, path, query);
        debug!(url = %url, "GET");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::DataUnavailable(e.to_string()))?;

        Self::read_json(response, BotError::DataUnavailable).await
    }

    async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<String>,
    ) -> Result<T> {
        let url = self.signed_url(path, params);
        debug!(path = %path, "signed GET");

        let response = self
            .http
            .get(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| BotError::AccountUnavailable(e.to_string()))?;

        Self::read_json(response, BotError::AccountUnavailable).await
    }

    async fn post_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<String>,
    ) -> Result<T> {
        let url = self.signed_url(path, params);
        debug!(path = %path, "signed POST");

        let response = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| BotError::OrderRejected(e.to_string()))?;

        Self::read_json(response, BotError::OrderRejected).await
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        wrap: fn(String) -> BotError,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) => format!("{} (code {})", err.msg, err.code),
                Err(_) => format!("{status} - {body}"),
            };
            return Err(wrap(detail));
        }

        response.json::<T>().await.map_err(|e| wrap(e.to_string()))
    }

    fn parse_decimal(raw: &str, wrap: fn(String) -> BotError) -> Result<Decimal> {
        Decimal::from_str(raw).map_err(|e| wrap(format!("bad decimal {raw:?}: {e}")))
    }
}

#[async_trait]
impl MarketData for BinanceFutures {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: u32,
    ) -> Result<CandleWindow> {
        let query = format!("symbol={}&interval={}&limit={}", symbol, interval, limit);
        let rows: Vec<RawKline> = self.get_public("/fapi/v1/klines", &query).await?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            let open_time = Utc
                .timestamp_millis_opt(row.0)
                .single()
                .ok_or_else(|| BotError::DataUnavailable(format!("bad open time {}", row.0)))?;
            candles.push(Candle {
                open_time,
                open: Self::parse_decimal(&row.1, BotError::DataUnavailable)?,
                high: Self::parse_decimal(&row.2, BotError::DataUnavailable)?,
                low: Self::parse_decimal(&row.3, BotError::DataUnavailable)?,
                close: Self::parse_decimal(&row.4, BotError::DataUnavailable)?,
                volume: Self::parse_decimal(&row.5, BotError::DataUnavailable)?,
            });
        }

        Ok(CandleWindow::new(candles))
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal> {
        let query = format!("symbol={symbol}");
        let ticker: super::types::TickerPrice =
            self.get_public("/fapi/v1/ticker/price", &query).await?;
        Ok(ticker.price)
    }
}

#[async_trait]
impl Account for BinanceFutures {
    async fn fetch_balance(&self) -> Result<Decimal> {
        let balances: Vec<AssetBalance> = self.get_signed("/fapi/v2/balance", vec![]).await?;

        Ok(balances
            .into_iter()
            .find(|b| b.asset == QUOTE_ASSET)
            .map(|b| b.balance)
            .unwrap_or(Decimal::ZERO))
    }

    async fn fetch_position(&self, symbol: &str) -> Result<BrokerPosition> {
        let positions: Vec<PositionRisk> = self
            .get_signed("/fapi/v2/positionRisk", vec![format!("symbol={symbol}")])
            .await?;

        Ok(positions
            .into_iter()
            .find(|p| p.symbol == symbol)
            .map(|p| BrokerPosition {
                amount: p.position_amt,
                entry_price: p.entry_price,
            })
            .unwrap_or(BrokerPosition {
                amount: Decimal::ZERO,
                entry_price: Decimal::ZERO,
            }))
    }
}

#[async_trait]
impl OrderGateway for BinanceFutures {
    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        let ack: LeverageAck = self
            .post_signed(
                "/fapi/v1/leverage",
                vec![format!("symbol={symbol}"), format!("leverage={leverage}")],
            )
            .await?;

        debug!(symbol = %ack.symbol, leverage = ack.leverage, "leverage set");
        Ok(())
    }

    async fn submit_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        client_order_id: &str,
    ) -> Result<()> {
        let ack: OrderAck = self
            .post_signed(
                "/fapi/v1/order",
                vec![
                    format!("symbol={symbol}"),
                    format!("side={}", side.as_str()),
                    "type=MARKET".to_string(),
                    format!("quantity={quantity}"),
                    format!("newClientOrderId={client_order_id}"),
                ],
            )
            .await?;

        debug!(
            order_id = ack.order_id,
            status = %ack.status,
            "market order acknowledged"
        );
        Ok(())
    }
}
