//! Exchange ports and their Binance futures / dry-run implementations.

mod binance;
mod paper;
mod ports;
mod types;

pub use binance::BinanceFutures;
pub use paper::PaperGateway;
pub use ports::{Account, BrokerPosition, MarketData, OrderGateway, OrderSide};
