//! Order quantity calculation. Pure: balance and price come in as arguments,
//! never as live lookups.

use rust_decimal::Decimal;

/// Lot precision (decimal places) per symbol. Unlisted symbols get the
/// coarser BTC-style precision.
pub fn lot_precision(symbol: &str) -> u32 {
    match symbol {
        "BTCUSDT" => 3,
        "ETHUSDT" => 2,
        _ => 3,
    }
}

/// Contract quantity for an entry:
/// `(balance * allocation * leverage) / price`, rounded to the symbol's lot
/// precision. Returns zero when balance or price make sizing meaningless;
/// callers never submit zero-quantity orders.
pub fn order_quantity(
    balance: Decimal,
    allocation: Decimal,
    leverage: u32,
    price: Decimal,
    precision: u32,
) -> Decimal {
    if balance <= Decimal::ZERO || price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let raw = balance * allocation * Decimal::from(leverage) / price;
    raw.round_dp(precision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reference_quantity() {
        // 10000 * 0.4 * 10 / 50000 = 0.8
        let qty = order_quantity(dec!(10000), dec!(0.4), 10, dec!(50000), 3);
        assert_eq!(qty, dec!(0.8));
    }

    #[test]
    fn test_rounds_to_lot_precision() {
        let qty = order_quantity(dec!(1000), dec!(0.4), 10, dec!(37123.45), 3);
        assert_eq!(qty, qty.round_dp(3));
        assert!(qty >= Decimal::ZERO);

        let eth_qty = order_quantity(dec!(1000), dec!(0.4), 10, dec!(2034.56), 2);
        assert_eq!(eth_qty, eth_qty.round_dp(2));
    }

    #[test]
    fn test_degenerate_inputs_size_to_zero() {
        assert_eq!(
            order_quantity(Decimal::ZERO, dec!(0.4), 10, dec!(50000), 3),
            Decimal::ZERO
        );
        assert_eq!(
            order_quantity(dec!(-5), dec!(0.4), 10, dec!(50000), 3),
            Decimal::ZERO
        );
        assert_eq!(
            order_quantity(dec!(10000), dec!(0.4), 10, Decimal::ZERO, 3),
            Decimal::ZERO
        );
        assert_eq!(
            order_quantity(dec!(10000), dec!(0.4), 10, dec!(-1), 3),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_precision_table() {
        assert_eq!(lot_precision("BTCUSDT"), 3);
        assert_eq!(lot_precision("ETHUSDT"), 2);
        assert_eq!(lot_precision("SOLUSDT"), 3);
    }
}
