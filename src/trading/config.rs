//! Per-strategy configuration and the default strategy fleet.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::models::CandleInterval;

use super::exit::ExitPolicy;

/// Which signal formula a strategy runs, with its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SignalSpec {
    /// Volatility breakout: bands at `open ± k * previous candle range`.
    Breakout { k: Decimal },
    /// Momentum movement over `lookback` candles with retracement entry.
    Movement { threshold: Decimal, lookback: usize },
}

impl SignalSpec {
    /// Minimum window length the variant needs.
    pub fn lookback(&self) -> usize {
        match self {
            Self::Breakout { .. } => 2,
            Self::Movement { lookback, .. } => *lookback,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Breakout { .. } => "breakout",
            Self::Movement { .. } => "movement",
        }
    }
}

/// Immutable configuration for one strategy instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy name used in every log line.
    pub name: String,

    /// Futures symbol, e.g. "BTCUSDT".
    pub symbol: String,

    /// Candle interval the signal is computed on. Also sets the flat poll
    /// cadence; while holding, the engine polls `interval / max_hold_bars`.
    pub interval: CandleInterval,

    pub signal: SignalSpec,

    /// Fraction of the wallet balance committed per entry (0, 1].
    pub allocation: Decimal,

    pub leverage: u32,

    /// ROI threshold for the profit-target exit; `None` disables it.
    pub profit_target: Option<Decimal>,

    /// One-tick trailing exit: close the instant price sets a new
    /// same-direction extreme after entry. Very tight; the momentum
    /// strategies use it, the breakout ones leave it off.
    pub trailing_exit: bool,

    /// Force-close after this many hold-monitoring ticks.
    pub max_hold_bars: u32,

    /// Wait after a close before the next entry is permitted.
    pub cooldown_secs: i64,
}

impl StrategyConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::seconds(self.cooldown_secs)
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        ExitPolicy {
            profit_target: self.profit_target,
            trailing: self.trailing_exit,
            max_hold_bars: self.max_hold_bars,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(BotError::ConfigInvalid(format!(
                "{}: symbol must not be empty",
                self.name
            )));
        }
        if self.leverage == 0 {
            return Err(BotError::ConfigInvalid(format!(
                "{}: leverage must be positive",
                self.name
            )));
        }
        if self.allocation <= Decimal::ZERO || self.allocation > Decimal::ONE {
            return Err(BotError::ConfigInvalid(format!(
                "{}: allocation must be in (0, 1], got {}",
                self.name, self.allocation
            )));
        }
        if self.max_hold_bars == 0 {
            return Err(BotError::ConfigInvalid(format!(
                "{}: max_hold_bars must be at least 1",
                self.name
            )));
        }
        if self.cooldown_secs < 0 {
            return Err(BotError::ConfigInvalid(format!(
                "{}: cooldown must not be negative",
                self.name
            )));
        }
        if let Some(target) = self.profit_target {
            if target <= Decimal::ZERO {
                return Err(BotError::ConfigInvalid(format!(
                    "{}: profit target must be positive, got {}",
                    self.name, target
                )));
            }
        }
        match &self.signal {
            SignalSpec::Breakout { k } => {
                if *k <= Decimal::ZERO {
                    return Err(BotError::ConfigInvalid(format!(
                        "{}: breakout multiplier must be positive, got {}",
                        self.name, k
                    )));
                }
            }
            SignalSpec::Movement {
                threshold,
                lookback,
            } => {
                if *threshold <= Decimal::ZERO {
                    return Err(BotError::ConfigInvalid(format!(
                        "{}: movement threshold must be positive, got {}",
                        self.name, threshold
                    )));
                }
                if *lookback < 2 {
                    return Err(BotError::ConfigInvalid(format!(
                        "{}: movement lookback must be at least 2, got {}",
                        self.name, lookback
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The built-in strategy fleet: two breakout instances and two momentum
/// instances, parameters taken from the scripts this bot replaces.
pub fn default_fleet() -> Vec<StrategyConfig> {
    vec![
        StrategyConfig {
            name: "vbs-btc".to_string(),
            symbol: "BTCUSDT".to_string(),
            interval: CandleInterval::M15,
            signal: SignalSpec::Breakout { k: dec!(0.5) },
            allocation: dec!(0.4),
            leverage: 10,
            profit_target: Some(dec!(0.05)),
            trailing_exit: false,
            max_hold_bars: 4,
            cooldown_secs: 900,
        },
        StrategyConfig {
            name: "vbs-eth".to_string(),
            symbol: "ETHUSDT".to_string(),
            interval: CandleInterval::M15,
            signal: SignalSpec::Breakout { k: dec!(0.5) },
            allocation: dec!(0.4),
            leverage: 10,
            profit_target: Some(dec!(0.05)),
            trailing_exit: false,
            max_hold_bars: 4,
            cooldown_secs: 900,
        },
        StrategyConfig {
            name: "swing".to_string(),
            symbol: "BTCUSDT".to_string(),
            interval: CandleInterval::H4,
            signal: SignalSpec::Movement {
                threshold: dec!(0.03),
                lookback: 6,
            },
            allocation: dec!(0.5),
            leverage: 10,
            profit_target: None,
            trailing_exit: true,
            max_hold_bars: 6,
            cooldown_secs: 0,
        },
        StrategyConfig {
            name: "scalp".to_string(),
            symbol: "BTCUSDT".to_string(),
            interval: CandleInterval::M1,
            signal: SignalSpec::Movement {
                threshold: dec!(0.015),
                lookback: 30,
            },
            allocation: dec!(0.25),
            leverage: 20,
            profit_target: None,
            trailing_exit: true,
            max_hold_bars: 30,
            cooldown_secs: 0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> StrategyConfig {
        StrategyConfig {
            name: "test".to_string(),
            symbol: "BTCUSDT".to_string(),
            interval: CandleInterval::M15,
            signal: SignalSpec::Breakout { k: dec!(0.5) },
            allocation: dec!(0.4),
            leverage: 10,
            profit_target: Some(dec!(0.05)),
            trailing_exit: false,
            max_hold_bars: 4,
            cooldown_secs: 900,
        }
    }

    #[test]
    fn test_default_fleet_validates() {
        for config in default_fleet() {
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_rejects_zero_leverage() {
        let mut config = base_config();
        config.leverage = 0;
        assert!(matches!(
            config.validate(),
            Err(BotError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_rejects_bad_allocation() {
        let mut config = base_config();
        config.allocation = Decimal::ZERO;
        assert!(config.validate().is_err());

        config.allocation = dec!(1.5);
        assert!(config.validate().is_err());

        config.allocation = Decimal::ONE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_signal_params() {
        let mut config = base_config();
        config.signal = SignalSpec::Breakout { k: Decimal::ZERO };
        assert!(config.validate().is_err());

        config.signal = SignalSpec::Movement {
            threshold: dec!(0.03),
            lookback: 1,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lookback_per_variant() {
        assert_eq!(SignalSpec::Breakout { k: dec!(0.5) }.lookback(), 2);
        assert_eq!(
            SignalSpec::Movement {
                threshold: dec!(0.03),
                lookback: 6
            }
            .lookback(),
            6
        );
    }
}
