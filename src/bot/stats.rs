//! Runtime counters for the bot.

/// Runtime counters for the bot. Logged periodically; not part of the
/// status contract.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub cycles: u64,
    pub quote_failures: u64,
    pub opportunities: u64,
    pub trades_executed: u64,
}
