//! Trading strategy configuration.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use super::duration;

fn default_pair() -> String {
    "BTC/USDT".to_string()
}

/// Strategy settings for the simulated arbitrage loop.
///
/// The strategy is directional by policy: only the case where the
/// `sell_venue` price is above the `buy_venue` price is ever evaluated.
/// Reversing the direction means swapping the two venue names, not a
/// code change.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Trading pair in "BASE/QUOTE" format.
    #[serde(default = "default_pair")]
    pub pair: String,
    /// Venue whose price is treated as the sell side.
    pub sell_venue: String,
    /// Venue whose price is treated as the buy side.
    pub buy_venue: String,
    /// Simulated starting balance in quote currency (e.g., "500").
    pub initial_funds: Decimal,
    /// Quote-currency amount committed per simulated trade (e.g., "200").
    pub trade_budget: Decimal,
    /// Minimum spread percentage that flags an opportunity (e.g., "0.005").
    pub min_spread_percent: Decimal,
    /// Taker fee applied on both legs, as a decimal (e.g., "0.0004").
    #[serde(default)]
    pub fee_rate: Decimal,
    /// Wait between cycles (default: 10s).
    #[serde(default, with = "duration")]
    pub poll_interval: Duration,
    /// Wait after a failed quote before the next cycle (default: 5s).
    #[serde(default, with = "duration")]
    pub error_backoff: Duration,
}
