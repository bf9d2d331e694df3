//! Data models for candles, intervals, and position state.

mod candle;
mod position;

pub use candle::{Candle, CandleInterval, CandleWindow};
pub use position::{PositionSide, PositionState};
