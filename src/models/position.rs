//! Local position state tracked by each strategy engine.
//!
//! One `PositionState` per engine instance; never shared. Two strategies
//! trading the same symbol each track their own position independently.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Which way the engine is positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSide {
    Flat,
    Long,
    Short,
}

impl PositionSide {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Flat => Self::Flat,
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

/// Per-engine position bookkeeping.
#[derive(Debug, Clone)]
pub struct PositionState {
    pub side: PositionSide,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    /// Highest price observed since entry (seeded at entry price).
    pub highest_price: Decimal,
    /// Lowest price observed since entry (seeded at entry price).
    pub lowest_price: Decimal,
    /// Completed hold-monitoring ticks since entry.
    pub bars_held: u32,
    /// Set on every close; gates re-entry by the configured cooldown.
    pub last_close_time: Option<DateTime<Utc>>,
}

impl PositionState {
    pub fn flat() -> Self {
        Self {
            side: PositionSide::Flat,
            quantity: Decimal::ZERO,
            entry_price: Decimal::ZERO,
            highest_price: Decimal::ZERO,
            lowest_price: Decimal::ZERO,
            bars_held: 0,
            last_close_time: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat
    }

    /// Transition Flat -> Long/Short after a successful entry order.
    pub fn open(&mut self, side: PositionSide, quantity: Decimal, price: Decimal) {
        self.side = side;
        self.quantity = quantity;
        self.entry_price = price;
        self.highest_price = price;
        self.lowest_price = price;
        self.bars_held = 0;
    }

    /// Transition back to Flat after a successful closing order.
    pub fn close(&mut self, now: DateTime<Utc>) {
        self.side = PositionSide::Flat;
        self.quantity = Decimal::ZERO;
        self.entry_price = Decimal::ZERO;
        self.highest_price = Decimal::ZERO;
        self.lowest_price = Decimal::ZERO;
        self.bars_held = 0;
        self.last_close_time = Some(now);
    }

    /// Fold a freshly observed price into the running extremes.
    pub fn observe(&mut self, price: Decimal) {
        if price > self.highest_price {
            self.highest_price = price;
        }
        if price < self.lowest_price {
            self.lowest_price = price;
        }
    }

    /// Unrealized return at `price`: positive when the position is winning.
    pub fn roi(&self, price: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        let raw = (price - self.entry_price) / self.entry_price;
        match self.side {
            PositionSide::Long => raw,
            PositionSide::Short => -raw,
            PositionSide::Flat => Decimal::ZERO,
        }
    }
}
