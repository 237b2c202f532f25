//! Simulated trade planning.

use rust_decimal::Decimal;

/// A profitable simulated round trip: buy on the cheap venue, sell on the
/// expensive one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradePlan {
    /// Quantity of base asset bought with the trade budget.
    pub amount: Decimal,
    /// Taker fee paid on the buy leg.
    pub buy_fee: Decimal,
    /// Taker fee paid on the sell leg.
    pub sell_fee: Decimal,
    /// Profit after both fees. Always positive.
    pub net_profit: Decimal,
}

/// Plans a simulated trade of `trade_budget` quote currency.
///
/// Returns `Some` only when the round trip nets a strictly positive
/// profit after fees; break-even and loss-making trades produce `None`
/// and must leave all state untouched at the caller.
///
/// Preconditions (checked by the caller, not here): an opportunity was
/// flagged by the spread evaluation and available funds cover the budget.
pub fn plan(
    buy_price: Decimal,
    sell_price: Decimal,
    trade_budget: Decimal,
    fee_rate: Decimal,
) -> Option<TradePlan> {
    if buy_price <= Decimal::ZERO {
        return None;
    }

    let amount = trade_budget / buy_price;
    let sell_value = amount * sell_price;
    let buy_fee = trade_budget * fee_rate;
    let sell_fee = sell_value * fee_rate;
    let net_profit = sell_value - trade_budget - buy_fee - sell_fee;

    if net_profit <= Decimal::ZERO {
        return None;
    }

    Some(TradePlan {
        amount,
        buy_fee,
        sell_fee,
        net_profit,
    })
}
