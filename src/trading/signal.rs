//! Signal calculators: pure functions from a candle window (plus the live
//! ticker price) to a directional bias.
//!
//! Both variants mix completed-candle data with the live price the same way
//! the strategies they replace did. That granularity mismatch is a known
//! compromise, kept on purpose.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::CandleWindow;

use super::config::SignalSpec;

/// Confirmed directional bias for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Long,
    Short,
}

/// Breakout bands derived from the previous candle's range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutLevels {
    pub buy_level: Decimal,
    pub sell_level: Decimal,
}

/// Compute breakout bands: `open[-1] ± k * (high[-2] - low[-2])`.
/// Needs at least two candles; otherwise no signal.
pub fn breakout_levels(window: &CandleWindow, k: Decimal) -> Option<BreakoutLevels> {
    let prev = window.prev()?;
    let latest = window.last()?;

    let range = prev.high - prev.low;
    Some(BreakoutLevels {
        buy_level: latest.open + range * k,
        sell_level: latest.open - range * k,
    })
}

/// Cumulative movement over the last `lookback` closes, with the retracement
/// level an entry waits for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementReading {
    /// Signed fractional change, e.g. 0.03 for a 3% rise.
    pub magnitude: Decimal,
    pub retrace_level: Decimal,
}

/// Compute the movement reading. Returns `None` when the window is shorter
/// than `lookback` or the movement has not reached `threshold`.
pub fn movement_reading(
    window: &CandleWindow,
    lookback: usize,
    threshold: Decimal,
) -> Option<MovementReading> {
    if lookback < 2 || window.len() < lookback {
        return None;
    }

    let start = window.nth_back(lookback)?.close;
    let end = window.last()?.close;
    if start.is_zero() {
        return None;
    }

    let magnitude = (end - start) / start;
    if magnitude.abs() < threshold {
        return None;
    }

    // Half the move is expected to retrace before entry.
    let retrace_level = end - (magnitude / dec!(2)) * end;
    Some(MovementReading {
        magnitude,
        retrace_level,
    })
}

impl SignalSpec {
    /// Evaluate the signal against a window and the live price.
    /// Deterministic for identical inputs; no side effects.
    pub fn evaluate(&self, window: &CandleWindow, live_price: Decimal) -> Option<Bias> {
        match self {
            Self::Breakout { k } => {
                let levels = breakout_levels(window, *k)?;
                let latest = window.last()?;

                let long = latest.high > levels.buy_level;
                let short = latest.low < levels.sell_level;
                match (long, short) {
                    (true, false) => Some(Bias::Long),
                    (false, true) => Some(Bias::Short),
                    // Both bands pierced in one candle is ambiguous.
                    _ => None,
                }
            }
            Self::Movement {
                threshold,
                lookback,
            } => {
                let reading = movement_reading(window, *lookback, *threshold)?;

                // An up-move that has retraced down to the level confirms a
                // long; a down-move that has bounced back up confirms a short.
                if reading.magnitude > Decimal::ZERO && live_price <= reading.retrace_level {
                    Some(Bias::Long)
                } else if reading.magnitude < Decimal::ZERO && live_price >= reading.retrace_level {
                    Some(Bias::Short)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use chrono::Utc;

    fn candle(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle {
            open_time: Utc::now(),
            open,
            high,
            low,
            close,
            volume: dec!(1),
        }
    }

    fn closes(values: &[Decimal]) -> CandleWindow {
        CandleWindow::new(values.iter().map(|&c| candle(c, c, c, c)).collect())
    }

    #[test]
    fn test_breakout_levels_from_prev_range() {
        // prev candle: high 110, low 90 -> range 20; latest open 100, k 0.5
        let window = CandleWindow::new(vec![
            candle(dec!(95), dec!(110), dec!(90), dec!(100)),
            candle(dec!(100), dec!(105), dec!(98), dec!(102)),
        ]);

        let levels = breakout_levels(&window, dec!(0.5)).unwrap();
        assert_eq!(levels.buy_level, dec!(110));
        assert_eq!(levels.sell_level, dec!(90));
    }

    #[test]
    fn test_breakout_trigger_edges() {
        let spec = SignalSpec::Breakout { k: dec!(0.5) };

        // high 111 pierces the 110 band -> long
        let window = CandleWindow::new(vec![
            candle(dec!(95), dec!(110), dec!(90), dec!(100)),
            candle(dec!(100), dec!(111), dec!(98), dec!(102)),
        ]);
        assert_eq!(spec.evaluate(&window, dec!(102)), Some(Bias::Long));

        // high 109 stays inside the bands -> nothing
        let window = CandleWindow::new(vec![
            candle(dec!(95), dec!(110), dec!(90), dec!(100)),
            candle(dec!(100), dec!(109), dec!(98), dec!(102)),
        ]);
        assert_eq!(spec.evaluate(&window, dec!(102)), None);

        // low 89 pierces the 90 band -> short
        let window = CandleWindow::new(vec![
            candle(dec!(95), dec!(110), dec!(90), dec!(100)),
            candle(dec!(100), dec!(105), dec!(89), dec!(102)),
        ]);
        assert_eq!(spec.evaluate(&window, dec!(102)), Some(Bias::Short));

        // both bands pierced -> ambiguous, no signal
        let window = CandleWindow::new(vec![
            candle(dec!(95), dec!(110), dec!(90), dec!(100)),
            candle(dec!(100), dec!(111), dec!(89), dec!(102)),
        ]);
        assert_eq!(spec.evaluate(&window, dec!(102)), None);
    }

    #[test]
    fn test_short_windows_yield_no_signal() {
        let breakout = SignalSpec::Breakout { k: dec!(0.5) };
        let movement = SignalSpec::Movement {
            threshold: dec!(0.01),
            lookback: 6,
        };

        for window in [
            CandleWindow::default(),
            closes(&[dec!(100)]),
            closes(&[dec!(100), dec!(101), dec!(102)]),
        ] {
            if window.len() < 2 {
                assert_eq!(breakout.evaluate(&window, dec!(100)), None);
            }
            assert_eq!(movement.evaluate(&window, dec!(100)), None);
        }
    }

    #[test]
    fn test_movement_below_threshold_is_no_signal() {
        // 1% move against a 3% threshold
        let window = closes(&[dec!(100), dec!(100.2), dec!(100.5), dec!(101)]);
        assert!(movement_reading(&window, 4, dec!(0.03)).is_none());
    }

    #[test]
    fn test_movement_retrace_confirms_long_after_up_move() {
        // 10% up move: 100 -> 110, retrace level = 110 - 0.05*110 = 104.5
        let window = closes(&[dec!(100), dec!(104), dec!(108), dec!(110)]);
        let reading = movement_reading(&window, 4, dec!(0.03)).unwrap();
        assert_eq!(reading.magnitude, dec!(0.1));
        assert_eq!(reading.retrace_level, dec!(104.5));

        let spec = SignalSpec::Movement {
            threshold: dec!(0.03),
            lookback: 4,
        };
        // Price has not pulled back yet
        assert_eq!(spec.evaluate(&window, dec!(109)), None);
        // Pullback to the level confirms a long
        assert_eq!(spec.evaluate(&window, dec!(104.5)), Some(Bias::Long));
        assert_eq!(spec.evaluate(&window, dec!(104)), Some(Bias::Long));
    }

    #[test]
    fn test_movement_retrace_confirms_short_after_down_move() {
        // 10% down move: 100 -> 90, retrace level = 90 + 0.05*90 = 94.5
        let window = closes(&[dec!(100), dec!(96), dec!(92), dec!(90)]);
        let reading = movement_reading(&window, 4, dec!(0.03)).unwrap();
        assert_eq!(reading.magnitude, dec!(-0.1));
        assert_eq!(reading.retrace_level, dec!(94.5));

        let spec = SignalSpec::Movement {
            threshold: dec!(0.03),
            lookback: 4,
        };
        assert_eq!(spec.evaluate(&window, dec!(91)), None);
        assert_eq!(spec.evaluate(&window, dec!(94.5)), Some(Bias::Short));
        assert_eq!(spec.evaluate(&window, dec!(95)), Some(Bias::Short));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let spec = SignalSpec::Movement {
            threshold: dec!(0.03),
            lookback: 4,
        };
        let window = closes(&[dec!(100), dec!(104), dec!(108), dec!(110)]);

        let first = spec.evaluate(&window, dec!(104));
        let second = spec.evaluate(&window, dec!(104));
        assert_eq!(first, second);
    }
}
