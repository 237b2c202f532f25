//! HTTP control surface for the bot.
//!
//! Thin facade: handlers only translate requests into controller calls
//! and ledger reads. Start/stop never fail as HTTP calls; only a ledger
//! read failure surfaces as a 500.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::bot::{Bot, BotError};
use crate::domain::TradeRecord;
use crate::storage::{StorageError, TradeLedger};

/// Default number of trades returned by the history endpoint.
const DEFAULT_TRADES_LIMIT: i64 = 50;

/// Upper bound for the history endpoint `limit` parameter.
const MAX_TRADES_LIMIT: i64 = 500;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
    pub ledger: Arc<dyn TradeLedger>,
}

/// Create the control router.
pub fn create_router(bot: Arc<Bot>, ledger: Arc<dyn TradeLedger>) -> Router {
    let state = AppState { bot, ledger };

    Router::new()
        .route("/health", get(health))
        .route("/start", get(start_bot).post(start_bot))
        .route("/stop", get(stop_bot))
        .route("/status", get(get_status))
        .route("/trades", get(get_trades))
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Start the worker. Reports "already running" instead of failing.
async fn start_bot(State(state): State<AppState>) -> Json<ControlResponse> {
    let status = match state.bot.start().await {
        Ok(()) => "Bot started",
        Err(BotError::AlreadyRunning) => "Bot is already running",
    };

    Json(ControlResponse {
        status: status.to_string(),
    })
}

/// Request a cooperative stop. Idempotent.
async fn stop_bot(State(state): State<AppState>) -> Json<ControlResponse> {
    state.bot.stop().await;

    Json(ControlResponse {
        status: "Bot stopped".to_string(),
    })
}

/// Current balance, profit, and max spread.
async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.bot.status().await;

    Json(StatusResponse {
        status: if snapshot.running {
            "running"
        } else {
            "stopped"
        }
        .to_string(),
        balance: to_number(snapshot.balance),
        profit: to_number(snapshot.profit),
        max_spread: to_number(snapshot.max_spread),
    })
}

/// Recent trades, newest first.
async fn get_trades(
    State(state): State<AppState>,
    Query(params): Query<TradesQuery>,
) -> Result<Json<Vec<TradeResponse>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_TRADES_LIMIT)
        .clamp(0, MAX_TRADES_LIMIT);

    let trades = state.ledger.recent(limit).await?;

    Ok(Json(trades.iter().map(TradeResponse::from).collect()))
}

// ===== Request/Response Types =====

#[derive(Debug, Deserialize)]
struct TradesQuery {
    /// Maximum number of trades to return.
    limit: Option<i64>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ControlResponse {
    status: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    balance: f64,
    profit: f64,
    max_spread: f64,
}

#[derive(Serialize)]
struct TradeResponse {
    buy_exchange: String,
    sell_exchange: String,
    buy_price: f64,
    sell_price: f64,
    amount: f64,
    profit: f64,
    timestamp: String,
}

impl From<&TradeRecord> for TradeResponse {
    fn from(record: &TradeRecord) -> Self {
        Self {
            buy_exchange: record.buy_exchange.clone(),
            sell_exchange: record.sell_exchange.clone(),
            buy_price: to_number(record.buy_price),
            sell_price: to_number(record.sell_price),
            amount: to_number(record.amount),
            profit: to_number(record.profit),
            timestamp: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Decimals are serialized as JSON numbers on the wire.
fn to_number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

// ===== Error Handling =====

#[derive(Debug)]
enum ApiError {
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Storage(err) => {
                tracing::error!(error = %err, "Ledger read failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
