//! Binance public REST ticker client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::exchanges::{PriceSource, QuoteError, Result};

const VENUE_NAME: &str = "binance";

/// Production Binance Spot REST endpoint.
const BASE_URL: &str = "https://api.binance.com";

/// HTTP request timeout. Bounds quote latency so a stop request takes
/// effect within a bounded delay.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response payload of `GET /api/v3/ticker/price`.
#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: Decimal,
}

/// Price source backed by the Binance spot ticker.
pub struct BinanceSource {
    http_client: HttpClient,
    base_url: String,
}

impl BinanceSource {
    /// Creates a new Binance price source. `base_url` overrides the
    /// production endpoint (mirrors, test servers).
    pub fn new(base_url: Option<String>) -> Self {
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build http client");

        Self {
            http_client,
            base_url: base_url.unwrap_or_else(|| BASE_URL.to_string()),
        }
    }
}

/// Converts "BTC/USDT" to Binance's "BTCUSDT" symbol format.
fn pair_to_symbol(pair: &str) -> String {
    pair.replace('/', "")
}

#[async_trait]
impl PriceSource for BinanceSource {
    async fn last_price(&self, pair: &str) -> Result<Decimal> {
        let symbol = pair_to_symbol(pair);
        let url = format!("{}/api/v3/ticker/price", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("symbol", symbol.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::Status(status));
        }

        let ticker: TickerPrice = response
            .json()
            .await
            .map_err(|e| QuoteError::Malformed(e.to_string()))?;

        if ticker.price <= Decimal::ZERO {
            return Err(QuoteError::Malformed(format!(
                "non-positive price {}",
                ticker.price
            )));
        }

        debug!(venue = VENUE_NAME, pair = %pair, price = %ticker.price, "last price");

        Ok(ticker.price)
    }

    fn name(&self) -> &str {
        VENUE_NAME
    }
}
