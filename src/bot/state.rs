//! Shared bot state.

use rust_decimal::Decimal;

/// Mutable state shared between the cycle worker and request handlers.
///
/// Invariant: `funds == initial_funds + cumulative_profit` at all times,
/// and `max_spread` never decreases. All fields are read and written
/// under the controller's single state lock.
#[derive(Debug, Clone)]
pub struct BotState {
    /// Current simulated balance in quote currency.
    pub funds: Decimal,
    /// Running sum of booked net profits.
    pub cumulative_profit: Decimal,
    /// Highest spread percentage ever observed.
    pub max_spread: Decimal,
    /// Lifecycle flag; true while a worker period is active.
    pub running: bool,
    /// Incremented on every start. A worker whose epoch no longer
    /// matches exits at its next iteration boundary, which keeps at most
    /// one worker alive across rapid stop/start sequences.
    pub epoch: u64,
}

impl BotState {
    pub fn new(initial_funds: Decimal) -> Self {
        Self {
            funds: initial_funds,
            cumulative_profit: Decimal::ZERO,
            max_spread: Decimal::ZERO,
            running: false,
            epoch: 0,
        }
    }
}

/// Point-in-time view of the bot state for the status surface.
#[derive(Debug, Clone, Copy)]
pub struct StatusSnapshot {
    pub running: bool,
    pub balance: Decimal,
    pub profit: Decimal,
    pub max_spread: Decimal,
}
