//! Error taxonomy shared by the exchange ports and the strategy engine.
//!
//! Every port call resolves to one of these variants so the tick loop can
//! log a failure with context and keep running. The binary boundary in
//! `main.rs` uses `anyhow` on top of this.

use thiserror::Error;

/// Domain errors surfaced by the ports and the engine.
#[derive(Debug, Error)]
pub enum BotError {
    /// Candle, ticker, or other market data could not be fetched.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    /// Balance or position information could not be fetched.
    #[error("account unavailable: {0}")]
    AccountUnavailable(String),

    /// The exchange refused a leverage change or an order.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// A strategy was configured with impossible parameters.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
