//! Trading logic: signals, sizing, exit policies, and the strategy engine.

mod config;
mod engine;
mod exit;
mod position_sizer;
mod signal;

pub use config::{default_fleet, SignalSpec, StrategyConfig};
pub use engine::{StrategyEngine, TickOutcome};
pub use exit::{ExitPolicy, ExitReason};
pub use position_sizer::{lot_precision, order_quantity};
pub use signal::{breakout_levels, movement_reading, Bias, BreakoutLevels, MovementReading};
