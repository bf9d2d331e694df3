//! Exit policies, evaluated in a fixed priority order each held tick.
//!
//! Order: profit-target, then trailing, then max-hold timeout. Signal
//! reversal is decided by the engine afterwards, only when none of these
//! fired. At most one exit per tick.

use rust_decimal::Decimal;

use crate::models::{PositionSide, PositionState};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    ProfitTarget,
    Trailing,
    MaxHold,
    SignalReversal,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProfitTarget => "profit_target",
            Self::Trailing => "trailing",
            Self::MaxHold => "max_hold",
            Self::SignalReversal => "signal_reversal",
        }
    }
}

/// Exit rules for one strategy instance.
#[derive(Debug, Clone)]
pub struct ExitPolicy {
    pub profit_target: Option<Decimal>,
    pub trailing: bool,
    pub max_hold_bars: u32,
}

/// Evaluate the policy against the current state and live price.
///
/// Trailing compares against the extremes from *before* this tick's price
/// is folded in: a long exits the instant the price matches or sets a new
/// high-water mark, a short symmetrically on a new low.
pub fn evaluate(policy: &ExitPolicy, state: &PositionState, price: Decimal) -> Option<ExitReason> {
    if state.is_flat() {
        return None;
    }

    if let Some(target) = policy.profit_target {
        if state.roi(price) >= target {
            return Some(ExitReason::ProfitTarget);
        }
    }

    if policy.trailing {
        let favorable = match state.side {
            PositionSide::Long => price >= state.highest_price,
            PositionSide::Short => price <= state.lowest_price,
            PositionSide::Flat => false,
        };
        if favorable {
            return Some(ExitReason::Trailing);
        }
    }

    if state.bars_held >= policy.max_hold_bars {
        return Some(ExitReason::MaxHold);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn held(side: PositionSide, entry: Decimal, bars_held: u32) -> PositionState {
        let mut state = PositionState::flat();
        state.open(side, dec!(1), entry);
        state.bars_held = bars_held;
        state
    }

    fn policy(target: Option<Decimal>, trailing: bool, max_hold: u32) -> ExitPolicy {
        ExitPolicy {
            profit_target: target,
            trailing,
            max_hold_bars: max_hold,
        }
    }

    #[test]
    fn test_profit_target_long_and_short() {
        let p = policy(Some(dec!(0.05)), false, 100);

        let long = held(PositionSide::Long, dec!(100), 0);
        assert_eq!(evaluate(&p, &long, dec!(105)), Some(ExitReason::ProfitTarget));
        assert_eq!(evaluate(&p, &long, dec!(104)), None);

        let short = held(PositionSide::Short, dec!(100), 0);
        assert_eq!(evaluate(&p, &short, dec!(95)), Some(ExitReason::ProfitTarget));
        assert_eq!(evaluate(&p, &short, dec!(96)), None);
    }

    #[test]
    fn test_trailing_fires_on_new_extreme() {
        let p = policy(None, true, 100);

        // Extremes are still at entry: any non-losing tick is a new extreme.
        let long = held(PositionSide::Long, dec!(100), 0);
        assert_eq!(evaluate(&p, &long, dec!(100)), Some(ExitReason::Trailing));
        assert_eq!(evaluate(&p, &long, dec!(101)), Some(ExitReason::Trailing));
        assert_eq!(evaluate(&p, &long, dec!(99)), None);

        // After the price has run up and pulled back, only a fresh high fires.
        let mut ran_up = held(PositionSide::Long, dec!(100), 1);
        ran_up.observe(dec!(110));
        assert_eq!(evaluate(&p, &ran_up, dec!(108)), None);
        assert_eq!(evaluate(&p, &ran_up, dec!(110)), Some(ExitReason::Trailing));

        let short = held(PositionSide::Short, dec!(100), 0);
        assert_eq!(evaluate(&p, &short, dec!(100)), Some(ExitReason::Trailing));
        assert_eq!(evaluate(&p, &short, dec!(101)), None);
    }

    #[test]
    fn test_max_hold_fires_regardless_of_roi() {
        let p = policy(None, false, 6);

        let losing = held(PositionSide::Long, dec!(100), 6);
        assert_eq!(evaluate(&p, &losing, dec!(80)), Some(ExitReason::MaxHold));

        let not_yet = held(PositionSide::Long, dec!(100), 5);
        assert_eq!(evaluate(&p, &not_yet, dec!(80)), None);
    }

    #[test]
    fn test_priority_profit_over_trailing_over_timeout() {
        // Everything would fire; profit target wins.
        let p = policy(Some(dec!(0.05)), true, 0);
        let state = held(PositionSide::Long, dec!(100), 3);
        assert_eq!(evaluate(&p, &state, dec!(110)), Some(ExitReason::ProfitTarget));

        // No profit: trailing beats timeout.
        let p = policy(Some(dec!(0.5)), true, 0);
        assert_eq!(evaluate(&p, &state, dec!(110)), Some(ExitReason::Trailing));
    }

    #[test]
    fn test_flat_state_never_exits() {
        let p = policy(Some(dec!(0.01)), true, 0);
        let state = PositionState::flat();
        assert_eq!(evaluate(&p, &state, dec!(100)), None);
    }
}
