//! The per-strategy state machine.
//!
//! One engine instance owns one `PositionState` and runs one decision per
//! tick: exits are evaluated first (profit target, trailing, max-hold), then
//! signal reversal, then fresh entries. Exactly one order-submitting
//! transition can happen per tick.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{Account, BrokerPosition, MarketData, OrderGateway, OrderSide};
use crate::error::Result;
use crate::models::{PositionSide, PositionState};

use super::config::StrategyConfig;
use super::exit::{self, ExitPolicy, ExitReason};
use super::position_sizer::{lot_precision, order_quantity};
use super::signal::Bias;

/// What a single tick decided. Every variant maps to one log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Entered(PositionSide),
    /// Closed one side and opened the other in a single compound action.
    Reversed(PositionSide),
    Exited(ExitReason),
    Holding,
    NoSignal,
    CooldownActive,
    SkippedZeroSize,
}

/// Strategy engine, generic over the three exchange ports.
pub struct StrategyEngine<M, A, O> {
    config: StrategyConfig,
    policy: ExitPolicy,
    market: M,
    account: A,
    orders: O,
    state: PositionState,
    leverage_set: bool,
}

impl<M, A, O> StrategyEngine<M, A, O>
where
    M: MarketData,
    A: Account,
    O: OrderGateway,
{
    pub fn new(config: StrategyConfig, market: M, account: A, orders: O) -> Self {
        let policy = config.exit_policy();
        Self {
            config,
            policy,
            market,
            account,
            orders,
            state: PositionState::flat(),
            leverage_set: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn side(&self) -> PositionSide {
        self.state.side
    }

    /// How long to sleep before the next tick: the full candle interval when
    /// flat, `interval / max_hold_bars` while a position is being monitored.
    pub fn next_poll(&self) -> Duration {
        let interval = self.config.interval.secs();
        if self.state.is_flat() {
            Duration::from_secs(interval)
        } else {
            let bars = u64::from(self.config.max_hold_bars.max(1));
            Duration::from_secs((interval / bars).max(1))
        }
    }

    /// Rebuild local state from the broker on startup. The engine is
    /// stateless across restarts; the exchange is the source of truth.
    pub async fn sync_position(&mut self) -> Result<()> {
        let broker = self.account.fetch_position(&self.config.symbol).await?;
        self.adopt_broker_position(&broker);
        Ok(())
    }

    fn adopt_broker_position(&mut self, broker: &BrokerPosition) {
        if broker.amount.is_zero() {
            let last_close = self.state.last_close_time;
            self.state = PositionState::flat();
            self.state.last_close_time = last_close;
            return;
        }

        let side = if broker.amount > Decimal::ZERO {
            PositionSide::Long
        } else {
            PositionSide::Short
        };
        self.state.open(side, broker.amount.abs(), broker.entry_price);
        info!(
            strategy = %self.config.name,
            symbol = %self.config.symbol,
            side = ?side,
            quantity = %self.state.quantity,
            entry = %self.state.entry_price,
            "adopted broker-reported position"
        );
    }

    /// One evaluation of the state machine. `now` is injected so cooldown
    /// behavior is testable.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome> {
        if self.state.is_flat() {
            self.tick_flat(now).await
        } else {
            self.tick_held(now).await
        }
    }

    async fn tick_flat(&mut self, now: DateTime<Utc>) -> Result<TickOutcome> {
        if let Some(closed_at) = self.state.last_close_time {
            if now - closed_at < self.config.cooldown() {
                debug!(
                    strategy = %self.config.name,
                    symbol = %self.config.symbol,
                    "entry blocked by cooldown"
                );
                return Ok(TickOutcome::CooldownActive);
            }
        }

        let limit = self.config.signal.lookback().max(2) as u32;
        let window = self
            .market
            .fetch_candles(&self.config.symbol, self.config.interval, limit)
            .await?;
        let price = self.market.fetch_price(&self.config.symbol).await?;

        let Some(bias) = self.config.signal.evaluate(&window, price) else {
            debug!(
                strategy = %self.config.name,
                symbol = %self.config.symbol,
                price = %price,
                "no signal"
            );
            return Ok(TickOutcome::NoSignal);
        };

        self.enter(bias, price).await
    }

    async fn tick_held(&mut self, now: DateTime<Utc>) -> Result<TickOutcome> {
        let price = self.market.fetch_price(&self.config.symbol).await?;

        // Exit policies run against the extremes from before this tick.
        if let Some(reason) = exit::evaluate(&self.policy, &self.state, price) {
            self.close(reason, price, now).await?;
            return Ok(TickOutcome::Exited(reason));
        }

        let limit = self.config.signal.lookback().max(2) as u32;
        let window = self
            .market
            .fetch_candles(&self.config.symbol, self.config.interval, limit)
            .await?;
        if let Some(bias) = self.config.signal.evaluate(&window, price) {
            let target = match bias {
                Bias::Long => PositionSide::Long,
                Bias::Short => PositionSide::Short,
            };
            if target == self.state.side.opposite() {
                return self.reverse(bias, price, now).await;
            }
        }

        self.state.observe(price);
        self.state.bars_held += 1;
        debug!(
            strategy = %self.config.name,
            symbol = %self.config.symbol,
            price = %price,
            roi = %self.state.roi(price),
            bars_held = self.state.bars_held,
            "holding"
        );
        Ok(TickOutcome::Holding)
    }

    async fn enter(&mut self, bias: Bias, price: Decimal) -> Result<TickOutcome> {
        let balance = self.account.fetch_balance().await?;
        let precision = lot_precision(&self.config.symbol);
        let quantity = order_quantity(
            balance,
            self.config.allocation,
            self.config.leverage,
            price,
            precision,
        );

        if quantity.is_zero() {
            warn!(
                strategy = %self.config.name,
                symbol = %self.config.symbol,
                balance = %balance,
                price = %price,
                "order sized to zero, skipping entry"
            );
            return Ok(TickOutcome::SkippedZeroSize);
        }

        self.ensure_leverage().await?;

        let (side, order_side) = match bias {
            Bias::Long => (PositionSide::Long, OrderSide::Buy),
            Bias::Short => (PositionSide::Short, OrderSide::Sell),
        };
        self.submit(order_side, quantity).await?;
        self.state.open(side, quantity, price);

        info!(
            strategy = %self.config.name,
            symbol = %self.config.symbol,
            side = ?side,
            quantity = %quantity,
            price = %price,
            "entered position"
        );
        Ok(TickOutcome::Entered(side))
    }

    async fn close(
        &mut self,
        reason: ExitReason,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let close_side = match self.state.side {
            PositionSide::Long => OrderSide::Sell,
            PositionSide::Short => OrderSide::Buy,
            PositionSide::Flat => return Ok(()),
        };

        self.submit(close_side, self.state.quantity).await?;

        info!(
            strategy = %self.config.name,
            symbol = %self.config.symbol,
            side = ?self.state.side,
            quantity = %self.state.quantity,
            price = %price,
            roi = %self.state.roi(price),
            reason = reason.as_str(),
            "closed position"
        );
        self.state.close(now);
        Ok(())
    }

    /// Close the current side and open the opposite one. Not atomic: if the
    /// close lands but the re-entry fails, the engine re-derives its state
    /// from the broker instead of trusting its last intent.
    async fn reverse(
        &mut self,
        bias: Bias,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome> {
        self.close(ExitReason::SignalReversal, price, now).await?;

        match self.enter(bias, price).await {
            Ok(TickOutcome::Entered(side)) => {
                info!(
                    strategy = %self.config.name,
                    symbol = %self.config.symbol,
                    side = ?side,
                    "reversed position"
                );
                Ok(TickOutcome::Reversed(side))
            }
            Ok(other) => Ok(other),
            Err(e) => {
                warn!(
                    strategy = %self.config.name,
                    symbol = %self.config.symbol,
                    error = %e,
                    "re-entry after reversal close failed, re-syncing from broker"
                );
                if let Err(sync_err) = self.sync_position().await {
                    warn!(
                        strategy = %self.config.name,
                        symbol = %self.config.symbol,
                        error = %sync_err,
                        "position re-sync failed, assuming flat"
                    );
                }
                Ok(TickOutcome::Exited(ExitReason::SignalReversal))
            }
        }
    }

    async fn submit(&self, side: OrderSide, quantity: Decimal) -> Result<()> {
        let client_order_id = Uuid::new_v4().to_string();
        self.orders
            .submit_market_order(&self.config.symbol, side, quantity, &client_order_id)
            .await
    }

    async fn ensure_leverage(&mut self) -> Result<()> {
        if self.leverage_set {
            return Ok(());
        }
        self.orders
            .set_leverage(&self.config.symbol, self.config.leverage)
            .await?;
        self.leverage_set = true;
        Ok(())
    }
}
