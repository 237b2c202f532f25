//! Simulated trade records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A booked simulated trade, as stored in the ledger.
///
/// Records are immutable once inserted; the ledger assigns `id` and
/// `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Ledger row id, monotonically increasing in insertion order.
    pub id: i64,
    /// Venue the base asset was bought on.
    pub buy_exchange: String,
    /// Venue the base asset was sold on.
    pub sell_exchange: String,
    /// Last traded price on the buy venue.
    pub buy_price: Decimal,
    /// Last traded price on the sell venue.
    pub sell_price: Decimal,
    /// Quantity of base asset bought.
    pub amount: Decimal,
    /// Net profit after fees. Positive by construction: loss-making
    /// trades are never booked.
    pub profit: Decimal,
    /// Assigned by the ledger at insertion.
    pub timestamp: DateTime<Utc>,
}

/// A trade produced by the executor, before the ledger assigns id and
/// timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub buy_exchange: String,
    pub sell_exchange: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub amount: Decimal,
    pub profit: Decimal,
}
