//! Dry-run order gateway: logs every order instead of submitting it.
//!
//! Market data and account reads still hit the real exchange in dry-run
//! mode; only the order path is swapped out.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::Result;

use super::ports::{OrderGateway, OrderSide};

/// Accepts every leverage change and order without side effects.
#[derive(Debug, Default)]
pub struct PaperGateway {
    orders_accepted: AtomicU64,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders_accepted(&self) -> u64 {
        self.orders_accepted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        info!(symbol = %symbol, leverage = leverage, "[DRY RUN] would set leverage");
        Ok(())
    }

    async fn submit_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        client_order_id: &str,
    ) -> Result<()> {
        self.orders_accepted.fetch_add(1, Ordering::Relaxed);
        info!(
            symbol = %symbol,
            side = side.as_str(),
            quantity = %quantity,
            client_order_id = %client_order_id,
            "[DRY RUN] would submit market order"
        );
        Ok(())
    }
}
