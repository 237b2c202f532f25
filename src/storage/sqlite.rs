//! SQLite implementation of TradeLedger.

use crate::domain::{NewTrade, TradeRecord};
use crate::storage::{StorageError, TradeLedger};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

/// SqliteLedger implements TradeLedger using SQLite.
pub struct SqliteLedger {
    pool: Pool<Sqlite>,
}

/// SqliteLedgerConfig holds SQLite ledger configuration.
#[derive(Debug, Clone)]
pub struct SqliteLedgerConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
}

impl Default for SqliteLedgerConfig {
    fn default() -> Self {
        Self {
            path: "trades.db".to_string(),
            max_connections: 5,
        }
    }
}

impl SqliteLedger {
    /// Creates a new SQLite ledger instance.
    pub async fn new(config: SqliteLedgerConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let ledger = Self { pool };

        ledger.migrate().await?;

        info!(path = %config.path, "SQLite trade ledger initialized");
        Ok(ledger)
    }

    /// Runs database migrations to create the schema.
    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                buy_exchange TEXT NOT NULL,
                sell_exchange TEXT NOT NULL,
                buy_price TEXT NOT NULL,
                sell_price TEXT NOT NULL,
                amount TEXT NOT NULL,
                profit TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_timestamp ON trades(timestamp)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TradeLedger for SqliteLedger {
    async fn insert(&self, trade: NewTrade) -> Result<TradeRecord, StorageError> {
        let timestamp = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO trades (
                buy_exchange, sell_exchange, buy_price, sell_price,
                amount, profit, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&trade.buy_exchange)
        .bind(&trade.sell_exchange)
        .bind(trade.buy_price.to_string())
        .bind(trade.sell_price.to_string())
        .bind(trade.amount.to_string())
        .bind(trade.profit.to_string())
        .bind(timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();

        debug!(id, profit = %trade.profit, "Trade persisted");

        Ok(TradeRecord {
            id,
            buy_exchange: trade.buy_exchange,
            sell_exchange: trade.sell_exchange,
            buy_price: trade.buy_price,
            sell_price: trade.sell_price,
            amount: trade.amount,
            profit: trade.profit,
            timestamp,
        })
    }

    async fn recent(&self, limit: i64) -> Result<Vec<TradeRecord>, StorageError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, buy_exchange, sell_exchange, buy_price, sell_price,
                amount, profit, timestamp
            FROM trades ORDER BY id DESC LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_trade_row).collect()
    }

    async fn count(&self) -> Result<i64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM trades")
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Parses a trade record from a database row.
fn parse_trade_row(row: &sqlx::sqlite::SqliteRow) -> Result<TradeRecord, StorageError> {
    let buy_price_str: String = row.try_get("buy_price")?;
    let buy_price = Decimal::from_str(&buy_price_str)
        .map_err(|e| StorageError::InvalidData(format!("Invalid buy_price: {}", e)))?;

    let sell_price_str: String = row.try_get("sell_price")?;
    let sell_price = Decimal::from_str(&sell_price_str)
        .map_err(|e| StorageError::InvalidData(format!("Invalid sell_price: {}", e)))?;

    let amount_str: String = row.try_get("amount")?;
    let amount = Decimal::from_str(&amount_str)
        .map_err(|e| StorageError::InvalidData(format!("Invalid amount: {}", e)))?;

    let profit_str: String = row.try_get("profit")?;
    let profit = Decimal::from_str(&profit_str)
        .map_err(|e| StorageError::InvalidData(format!("Invalid profit: {}", e)))?;

    let timestamp_str: String = row.try_get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|e| StorageError::InvalidData(format!("Invalid timestamp: {}", e)))?
        .with_timezone(&Utc);

    Ok(TradeRecord {
        id: row.try_get("id")?,
        buy_exchange: row.try_get("buy_exchange")?,
        sell_exchange: row.try_get("sell_exchange")?,
        buy_price,
        sell_price,
        amount,
        profit,
        timestamp,
    })
}
