//! Runs strategy engines concurrently, one tokio task each, with a shared
//! cooperative shutdown signal.
//!
//! A stop request is advisory: each loop checks it at the top of every
//! iteration and while sleeping, but an in-flight tick (including its order
//! submissions) always completes.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::{Account, MarketData, OrderGateway};
use crate::trading::StrategyEngine;

/// Back off this long after a failed tick before retrying.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Escalate from warn to error after this many consecutive failed ticks.
const ESCALATE_AFTER: u32 = 3;

/// Supervises one task per strategy engine.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            handles: Vec::new(),
        }
    }

    /// Spawn a strategy loop. The engine re-syncs its position from the
    /// broker before its first tick.
    pub fn spawn<M, A, O>(&mut self, engine: StrategyEngine<M, A, O>)
    where
        M: MarketData + 'static,
        A: Account + 'static,
        O: OrderGateway + 'static,
    {
        let rx = self.shutdown.subscribe();
        self.handles.push(tokio::spawn(run_engine(engine, rx)));
    }

    /// Request a cooperative stop of every strategy loop.
    pub fn shutdown_now(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Wait for all strategy loops to finish.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "strategy task aborted");
            }
        }
    }

    /// Block until Ctrl-C, then stop every loop and wait for them.
    pub async fn run_until_shutdown(self) {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown signal received");
        self.shutdown_now();
        self.join().await;
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_engine<M, A, O>(
    mut engine: StrategyEngine<M, A, O>,
    mut shutdown: watch::Receiver<bool>,
) where
    M: MarketData,
    A: Account,
    O: OrderGateway,
{
    info!(strategy = %engine.name(), symbol = %engine.symbol(), "strategy started");

    if let Err(e) = engine.sync_position().await {
        warn!(
            strategy = %engine.name(),
            symbol = %engine.symbol(),
            error = %e,
            "startup position sync failed, assuming flat"
        );
    }

    let mut consecutive_errors = 0u32;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let delay = match engine.tick(chrono::Utc::now()).await {
            Ok(_) => {
                consecutive_errors = 0;
                engine.next_poll()
            }
            Err(e) => {
                consecutive_errors += 1;
                if consecutive_errors >= ESCALATE_AFTER {
                    error!(
                        strategy = %engine.name(),
                        symbol = %engine.symbol(),
                        error = %e,
                        consecutive_errors,
                        "tick failed repeatedly, still retrying"
                    );
                } else {
                    warn!(
                        strategy = %engine.name(),
                        symbol = %engine.symbol(),
                        error = %e,
                        "tick failed"
                    );
                }
                ERROR_BACKOFF
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => {}
        }
    }

    info!(strategy = %engine.name(), symbol = %engine.symbol(), "strategy stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BrokerPosition, OrderSide};
    use crate::error::Result;
    use crate::models::{CandleInterval, CandleWindow};
    use crate::trading::{SignalSpec, StrategyConfig};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Quiet ports: no data, flat account, orders accepted.
    struct NullPorts;

    #[async_trait]
    impl MarketData for NullPorts {
        async fn fetch_candles(
            &self,
            _symbol: &str,
            _interval: CandleInterval,
            _limit: u32,
        ) -> Result<CandleWindow> {
            Ok(CandleWindow::default())
        }

        async fn fetch_price(&self, _symbol: &str) -> Result<Decimal> {
            Ok(dec!(100))
        }
    }

    #[async_trait]
    impl Account for NullPorts {
        async fn fetch_balance(&self) -> Result<Decimal> {
            Ok(Decimal::ZERO)
        }

        async fn fetch_position(&self, _symbol: &str) -> Result<BrokerPosition> {
            Ok(BrokerPosition {
                amount: Decimal::ZERO,
                entry_price: Decimal::ZERO,
            })
        }
    }

    #[async_trait]
    impl OrderGateway for NullPorts {
        async fn set_leverage(&self, _symbol: &str, _leverage: u32) -> Result<()> {
            Ok(())
        }

        async fn submit_market_order(
            &self,
            _symbol: &str,
            _side: OrderSide,
            _quantity: Decimal,
            _client_order_id: &str,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn idle_config(name: &str) -> StrategyConfig {
        StrategyConfig {
            name: name.to_string(),
            symbol: "BTCUSDT".to_string(),
            interval: CandleInterval::H4,
            signal: SignalSpec::Breakout { k: dec!(0.5) },
            allocation: dec!(0.4),
            leverage: 10,
            profit_target: None,
            trailing_exit: false,
            max_hold_bars: 6,
            cooldown_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_all_loops() {
        let mut scheduler = Scheduler::new();
        scheduler.spawn(StrategyEngine::new(
            idle_config("one"),
            NullPorts,
            NullPorts,
            NullPorts,
        ));
        scheduler.spawn(StrategyEngine::new(
            idle_config("two"),
            NullPorts,
            NullPorts,
            NullPorts,
        ));

        // Let the loops run their first tick, then stop them.
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.shutdown_now();

        tokio::time::timeout(Duration::from_secs(5), scheduler.join())
            .await
            .expect("loops must observe the shutdown signal");
    }
}
