//! OHLCV candles, candle windows, and the exchange interval grid.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One completed (or in-progress, for the latest slot) OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Ordered candle sequence, most-recent-last.
///
/// Signal calculators treat a window shorter than their lookback as
/// "no signal" rather than an error.
#[derive(Debug, Clone, Default)]
pub struct CandleWindow(Vec<Candle>);

impl CandleWindow {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self(candles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Latest candle in the window.
    pub fn last(&self) -> Option<&Candle> {
        self.0.last()
    }

    /// Previous completed candle (second-to-last).
    pub fn prev(&self) -> Option<&Candle> {
        let n = self.0.len();
        if n < 2 {
            return None;
        }
        self.0.get(n - 2)
    }

    /// The candle `n` slots back from the end, where `n = 1` is the latest.
    /// Used as the start of an `n`-bar lookback.
    pub fn nth_back(&self, n: usize) -> Option<&Candle> {
        if n == 0 || n > self.0.len() {
            return None;
        }
        self.0.get(self.0.len() - n)
    }
}

/// Candle interval supported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandleInterval {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H6,
    H8,
    H12,
    D1,
}

impl CandleInterval {
    /// Exchange interval code, e.g. "15m".
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M3 => "3m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H2 => "2h",
            Self::H4 => "4h",
            Self::H6 => "6h",
            Self::H8 => "8h",
            Self::H12 => "12h",
            Self::D1 => "1d",
        }
    }

    /// Interval length in seconds.
    pub fn secs(&self) -> u64 {
        match self {
            Self::M1 => 60,
            Self::M3 => 180,
            Self::M5 => 300,
            Self::M15 => 900,
            Self::M30 => 1800,
            Self::H1 => 3600,
            Self::H2 => 7200,
            Self::H4 => 14400,
            Self::H6 => 21600,
            Self::H8 => 28800,
            Self::H12 => 43200,
            Self::D1 => 86400,
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Self::M1),
            "3m" => Ok(Self::M3),
            "5m" => Ok(Self::M5),
            "15m" => Ok(Self::M15),
            "30m" => Ok(Self::M30),
            "1h" => Ok(Self::H1),
            "2h" => Ok(Self::H2),
            "4h" => Ok(Self::H4),
            "6h" => Ok(Self::H6),
            "8h" => Ok(Self::H8),
            "12h" => Ok(Self::H12),
            "1d" => Ok(Self::D1),
            other => Err(format!("unknown candle interval: {other}")),
        }
    }
}
