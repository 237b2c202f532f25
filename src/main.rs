mod bot;
mod config;
mod domain;
mod exchanges;
mod server;
mod storage;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use bot::Bot;
use config::Config;
use exchanges::PriceSource;
use storage::{SqliteLedger, SqliteLedgerConfig, TradeLedger};

const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

/// How long shutdown waits for the worker to observe the stop flag.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn parse_config_path() -> String {
    for arg in env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    DEFAULT_CONFIG_PATH.to_string()
}

fn init_tracing(log_level: Option<&str>) {
    let level = match log_level {
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("warn") | Some("warning") => Level::WARN,
        Some("error") => Level::ERROR,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Builds the sell-side and buy-side price sources from config.
fn build_sources(
    config: &Config,
) -> exchanges::Result<(Arc<dyn PriceSource>, Arc<dyn PriceSource>)> {
    let trading = &config.trading;

    // Validation already checked both venues are configured and enabled.
    let sell_cfg = config.exchanges.get(&trading.sell_venue).cloned().unwrap_or_default();
    let buy_cfg = config.exchanges.get(&trading.buy_venue).cloned().unwrap_or_default();

    let sell_source = exchanges::create_source(&trading.sell_venue, &sell_cfg)?;
    let buy_source = exchanges::create_source(&trading.buy_venue, &buy_cfg)?;

    Ok((sell_source, buy_source))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config_path = parse_config_path();

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return;
        }
    };

    init_tracing(config.app.log_level.as_deref());

    info!(config = %config_path, app = %config.app.name, "Configuration loaded");

    let storage_cfg = config.storage.clone().unwrap_or_default();
    let ledger_cfg = SqliteLedgerConfig {
        path: storage_cfg
            .path
            .unwrap_or_else(|| SqliteLedgerConfig::default().path),
        max_connections: storage_cfg
            .max_connections
            .unwrap_or_else(|| SqliteLedgerConfig::default().max_connections),
    };

    let ledger: Arc<dyn TradeLedger> = match SqliteLedger::new(ledger_cfg).await {
        Ok(ledger) => Arc::new(ledger),
        Err(e) => {
            eprintln!("Failed to initialize trade ledger: {}", e);
            return;
        }
    };

    let (sell_source, buy_source) = match build_sources(&config) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("Failed to create price sources: {}", e);
            return;
        }
    };

    let bot = Arc::new(Bot::new(
        config.trading.clone(),
        sell_source,
        buy_source,
        Arc::clone(&ledger),
    ));

    let server_cfg = config.server.clone().unwrap_or_default();
    let addr = format!("{}:{}", server_cfg.host, server_cfg.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", addr, e);
            return;
        }
    };

    info!(addr = %addr, "Control server listening");

    let app = server::create_router(Arc::clone(&bot), Arc::clone(&ledger));

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server error");
    }

    bot.stop().await;
    if tokio::time::timeout(SHUTDOWN_GRACE, bot.join()).await.is_err() {
        warn!("Worker did not stop within the grace period");
    }

    let status = bot.status().await;
    let stats = bot.stats().await;
    let total_trades = ledger.count().await.unwrap_or_default();
    info!(
        balance = %status.balance,
        profit = %status.profit,
        max_spread = %status.max_spread,
        cycles = stats.cycles,
        trades = total_trades,
        "Final report"
    );

    if let Err(e) = ledger.close().await {
        warn!(error = %e, "Failed to close trade ledger");
    }

    info!("Shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
