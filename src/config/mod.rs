//! Configuration loading and validation for the arbitrage simulator.
//!
//! Uses serde_yaml to load YAML configuration files. All decimal values
//! are quoted strings in YAML (e.g. `initial_funds: "500"`) and parsed
//! into `rust_decimal::Decimal`.

mod app;
mod duration;
mod error;
mod server;
mod storage;
mod trading;
mod venue;

pub use app::AppConfig;
pub use error::ConfigError;
pub use server::ServerConfig;
pub use storage::StorageConfig;
pub use trading::TradingConfig;
pub use venue::VenueConfig;

use rust_decimal::Decimal;
use serde::Deserialize;
use std::{collections::HashMap, fs};

/// Root configuration structure.
///
/// Required sections: app, exchanges, trading.
/// Optional sections: storage, server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application-level settings like name and log level.
    pub app: AppConfig,
    /// Maps venue names to their configurations.
    pub exchanges: HashMap<String, VenueConfig>,
    /// Strategy parameters and polling cadence.
    pub trading: TradingConfig,
    /// Trade ledger persistence (optional).
    pub storage: Option<StorageConfig>,
    /// HTTP control surface (optional).
    pub server: Option<ServerConfig>,
}

impl Config {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Loads environment variables from `.env` first (if present), then
    /// parses and validates the YAML. An invalid configuration is a fatal
    /// startup error; the process must not start with one.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.is_empty() {
            return Err(ConfigError::Validation("app.name is required".into()));
        }

        let t = &self.trading;

        if t.pair.is_empty() {
            return Err(ConfigError::Validation("trading.pair is required".into()));
        }

        if t.sell_venue == t.buy_venue {
            return Err(ConfigError::Validation(
                "trading.sell_venue and trading.buy_venue must differ".into(),
            ));
        }

        for venue in [&t.sell_venue, &t.buy_venue] {
            match self.exchanges.get(venue) {
                Some(cfg) if cfg.enabled => {}
                Some(_) => {
                    return Err(ConfigError::Validation(format!(
                        "venue {} is not enabled",
                        venue
                    )));
                }
                None => {
                    return Err(ConfigError::Validation(format!(
                        "venue {} is not configured",
                        venue
                    )));
                }
            }
        }

        if t.initial_funds <= Decimal::ZERO {
            return Err(ConfigError::Validation(
                "trading.initial_funds must be positive".into(),
            ));
        }

        if t.trade_budget <= Decimal::ZERO {
            return Err(ConfigError::Validation(
                "trading.trade_budget must be positive".into(),
            ));
        }

        if t.trade_budget > t.initial_funds {
            return Err(ConfigError::Validation(
                "trading.trade_budget cannot exceed trading.initial_funds".into(),
            ));
        }

        if t.min_spread_percent < Decimal::ZERO {
            return Err(ConfigError::Validation(
                "trading.min_spread_percent cannot be negative".into(),
            ));
        }

        if t.fee_rate < Decimal::ZERO || t.fee_rate >= Decimal::ONE {
            return Err(ConfigError::Validation(
                "trading.fee_rate must be in [0, 1)".into(),
            ));
        }

        Ok(())
    }
}
