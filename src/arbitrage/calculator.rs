use bigdecimal::BigDecimal;

/// Decimal places kept for the exit price in published results.
pub const EXIT_PRICE_SCALE: i64 = 4;
/// Decimal places kept for the profit percentage in published results.
pub const PROFIT_PERCENT_SCALE: i64 = 2;

/// Outcome of the minimum-volume gate for one side of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liquidity {
    Sufficient,
    /// No volume was published for the market.
    Unknown,
    BelowMinimum,
}

/// Local-currency value of one unit bought on the bridge-quoted market.
pub fn exit_price(bridge_quoted_price: &BigDecimal, bridge_rate: &BigDecimal) -> BigDecimal {
    bridge_quoted_price * bridge_rate
}

/// Spread of `exit` over `entry` in percent.
///
/// Returns `None` for a non-positive entry price instead of dividing by it.
pub fn profit_percent(entry_price: &BigDecimal, exit_price: &BigDecimal) -> Option<BigDecimal> {
    if *entry_price <= BigDecimal::from(0) {
        return None;
    }

    let difference = exit_price - entry_price;
    Some(&difference / entry_price * BigDecimal::from(100))
}

pub fn check_liquidity(volume: Option<&BigDecimal>, minimum: &BigDecimal) -> Liquidity {
    match volume {
        None => Liquidity::Unknown,
        Some(volume) if volume >= minimum => Liquidity::Sufficient,
        Some(_) => Liquidity::BelowMinimum,
    }
}

/// Ties round away from zero on the exact decimal value.
pub fn round_exit_price(price: &BigDecimal) -> BigDecimal {
    price.round(EXIT_PRICE_SCALE)
}

pub fn round_profit_percent(percent: &BigDecimal) -> BigDecimal {
    percent.round(PROFIT_PERCENT_SCALE)
}
