//! Venue price clients and the price source abstraction.

mod binance;
mod kucoin;

pub use binance::BinanceSource;
pub use kucoin::KucoinSource;

use crate::config::VenueConfig;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

/// Quote errors. The controller treats all of these uniformly: log,
/// back off, keep looping.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// No client exists for this venue name.
    #[error("venue {0} is not supported")]
    UnsupportedVenue(String),

    /// Transport-level failure (connect, timeout, TLS).
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status from the venue.
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// Error reported in the venue's response envelope.
    #[error("venue error {code}: {message}")]
    Venue { code: String, message: String },

    /// Response did not contain a usable price.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result type for quote operations.
pub type Result<T> = std::result::Result<T, QuoteError>;

/// PriceSource defines the interface for sampling a venue's last traded
/// price. Failure causes are opaque to the caller; retry and backoff are
/// the controller's responsibility.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches the last traded price for a pair in "BASE/QUOTE" format.
    async fn last_price(&self, pair: &str) -> Result<Decimal>;

    /// Unique venue identifier (e.g. "binance").
    fn name(&self) -> &str;
}

/// Factory method to create a price source for the given venue name.
pub fn create_source(name: &str, config: &VenueConfig) -> Result<Arc<dyn PriceSource>> {
    match name.to_lowercase().as_str() {
        "binance" => Ok(Arc::new(BinanceSource::new(config.base_url.clone()))),
        "kucoin" => Ok(Arc::new(KucoinSource::new(config.base_url.clone()))),
        _ => Err(QuoteError::UnsupportedVenue(name.to_string())),
    }
}
