//! KuCoin public REST ticker client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::exchanges::{PriceSource, QuoteError, Result};

const VENUE_NAME: &str = "kucoin";

/// Production KuCoin Spot REST endpoint.
const BASE_URL: &str = "https://api.kucoin.com";

/// Success code in KuCoin response envelopes.
const SUCCESS_CODE: &str = "200000";

/// HTTP request timeout. Bounds quote latency so a stop request takes
/// effect within a bounded delay.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// KuCoin wraps every payload in a `{code, msg, data}` envelope.
#[derive(Debug, Deserialize)]
struct Level1Response {
    code: String,
    msg: Option<String>,
    data: Option<Level1Data>,
}

/// Payload of `GET /api/v1/market/orderbook/level1`.
#[derive(Debug, Deserialize)]
struct Level1Data {
    price: Decimal,
}

/// Price source backed by the KuCoin level-1 ticker.
pub struct KucoinSource {
    http_client: HttpClient,
    base_url: String,
}

impl KucoinSource {
    /// Creates a new KuCoin price source. `base_url` overrides the
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

/// Converts "BTC/USDT" to KuCoin's "BTC-USDT" symbol format.
fn pair_to_symbol(pair: &str) -> String {
    pair.replace('/', "-")
}

#[async_trait]
impl PriceSource for KucoinSource {
    async fn last_price(&self, pair: &str) -> Result<Decimal> {
        let symbol = pair_to_symbol(pair);
        let url = format!("{}/api/v1/market/orderbook/level1", self.base_url);

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

        let envelope: Level1Response = response
            .json()
            .await
            .map_err(|e| QuoteError::Malformed(e.to_string()))?;

        if envelope.code != SUCCESS_CODE {
            return Err(QuoteError::Venue {
                code: envelope.code,
                message: envelope.msg.unwrap_or_default(),
            });
        }

        let data = envelope
            .data
            .ok_or_else(|| QuoteError::Malformed("missing data field".to_string()))?;

        if data.price <= Decimal::ZERO {
            return Err(QuoteError::Malformed(format!(
                "non-positive price {}",
                data.price
            )));
        }

        debug!(venue = VENUE_NAME, pair = %pair, price = %data.price, "last price");

        Ok(data.price)
    }

    fn name(&self) -> &str {
        VENUE_NAME
    }
}
