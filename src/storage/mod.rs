//! Storage interfaces and implementations for the trade ledger.

mod sqlite;

pub use sqlite::{SqliteLedger, SqliteLedgerConfig};

use crate::domain::{NewTrade, TradeRecord};
use async_trait::async_trait;

/// TradeLedger defines the interface for the durable append-only store
/// of executed simulated trades.
#[async_trait]
pub trait TradeLedger: Send + Sync {
    /// Appends a trade, assigning its timestamp at insertion.
    /// Returns the stored record. A storage failure is surfaced to the
    /// caller; it is never silent.
    async fn insert(&self, trade: NewTrade) -> Result<TradeRecord, StorageError>;

    /// Returns up to `limit` trades ordered newest-first. Returns fewer
    /// if fewer exist; an empty ledger yields an empty vec, not an error.
    async fn recent(&self, limit: i64) -> Result<Vec<TradeRecord>, StorageError>;

    /// Returns the total number of stored trades.
    async fn count(&self) -> Result<i64, StorageError>;

    /// Closes the storage connection.
    async fn close(&self) -> Result<(), StorageError>;
}

/// StorageError represents errors that can occur during ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
