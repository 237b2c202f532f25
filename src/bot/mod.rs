//! Arbitrage controller: lifecycle, polling loop, and fund accounting.
//!
//! One background worker runs the quote → evaluate → execute → persist
//! cycle; request handlers call start/stop/status concurrently with it.

mod error;
mod state;
mod stats;

pub use error::BotError;
pub use state::{BotState, StatusSnapshot};
pub use stats::Stats;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::TradingConfig;
use crate::domain::{self, NewTrade};
use crate::exchanges::{PriceSource, QuoteError};
use crate::storage::TradeLedger;

/// Default wait between cycles when the config leaves it unset.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default wait after a failed quote when the config leaves it unset.
const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Every how many cycles the price line is logged at info level.
const CYCLE_LOG_EVERY: u64 = 20;

/// Arbitrage controller. Owns the shared state and the worker lifecycle.
pub struct Bot {
    cfg: TradingConfig,
    sell_source: Arc<dyn PriceSource>,
    buy_source: Arc<dyn PriceSource>,
    ledger: Arc<dyn TradeLedger>,

    poll_interval: Duration,
    error_backoff: Duration,

    state: Mutex<BotState>,
    stats: Mutex<Stats>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Bot {
    /// Creates a new Bot instance. The config is assumed validated;
    /// unset intervals fall back to the defaults.
    pub fn new(
        cfg: TradingConfig,
        sell_source: Arc<dyn PriceSource>,
        buy_source: Arc<dyn PriceSource>,
        ledger: Arc<dyn TradeLedger>,
    ) -> Self {
        let poll_interval = if cfg.poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            cfg.poll_interval
        };

        let error_backoff = if cfg.error_backoff.is_zero() {
            DEFAULT_ERROR_BACKOFF
        } else {
            cfg.error_backoff
        };

        let state = Mutex::new(BotState::new(cfg.initial_funds));

        Self {
            cfg,
            sell_source,
            buy_source,
            ledger,
            poll_interval,
            error_backoff,
            state,
            stats: Mutex::new(Stats::default()),
            worker: Mutex::new(None),
        }
    }

    /// Starts the worker. Returns `AlreadyRunning` without side effects
    /// when a running period is active; at most one worker is live per
    /// period even under concurrent calls.
    pub async fn start(self: &Arc<Self>) -> Result<(), BotError> {
        let epoch = {
            let mut state = self.state.lock().await;
            if state.running {
                return Err(BotError::AlreadyRunning);
            }
            state.running = true;
            state.epoch += 1;
            state.epoch
        };

        info!(
            pair = %self.cfg.pair,
            sell_venue = self.sell_source.name(),
            buy_venue = self.buy_source.name(),
            funds = %self.cfg.initial_funds,
            "Starting arbitrage worker"
        );

        let bot = Arc::clone(self);
        let handle = tokio::spawn(async move { bot.run_loop(epoch).await });

        // A handle from a previous running period may still be draining
        // its last wait; its stale epoch makes it exit on its own.
        let mut worker = self.worker.lock().await;
        *worker = Some(handle);

        Ok(())
    }

    /// Requests a cooperative stop. The worker observes it at its next
    /// iteration boundary; an in-flight cycle completes. Safe to call
    /// when already stopped.
    pub async fn stop(&self) {
        let was_running = {
            let mut state = self.state.lock().await;
            let was = state.running;
            state.running = false;
            was
        };

        if was_running {
            info!("Stop requested; worker exits at its next cycle boundary");
        } else {
            debug!("Stop requested while already stopped");
        }
    }

    /// Returns a consistent snapshot of the shared state. Never waits on
    /// the worker.
    pub async fn status(&self) -> StatusSnapshot {
        let state = self.state.lock().await;
        StatusSnapshot {
            running: state.running,
            balance: state.funds,
            profit: state.cumulative_profit,
            max_spread: state.max_spread,
        }
    }

    /// Returns true if a running period is active.
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    /// Returns a copy of the runtime counters.
    pub async fn stats(&self) -> Stats {
        self.stats.lock().await.clone()
    }

    /// Waits for the worker task spawned by the last start to finish.
    pub async fn join(&self) {
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Worker loop: one cycle per poll interval until stopped or
    /// superseded by a newer epoch.
    async fn run_loop(&self, my_epoch: u64) {
        info!(
            poll_interval = ?self.poll_interval,
            error_backoff = ?self.error_backoff,
            "Worker loop started"
        );

        loop {
            if !self.is_live(my_epoch).await {
                break;
            }

            if let Err(e) = self.run_cycle().await {
                {
                    let mut stats = self.stats.lock().await;
                    stats.quote_failures += 1;
                }
                warn!(error = %e, "Quote failed, backing off");
                tokio::time::sleep(self.error_backoff).await;
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        info!("Worker loop stopped");
    }

    async fn is_live(&self, my_epoch: u64) -> bool {
        let state = self.state.lock().await;
        state.running && state.epoch == my_epoch
    }

    /// Runs one cycle: quote both venues, evaluate the spread, book a
    /// trade when profitable, persist it.
    async fn run_cycle(&self) -> Result<(), QuoteError> {
        let cycles = {
            let mut stats = self.stats.lock().await;
            stats.cycles += 1;
            stats.cycles
        };

        let pair = self.cfg.pair.as_str();

        // No ordering dependency between the two quotes.
        let (sell_price, buy_price) = tokio::try_join!(
            self.sell_source.last_price(pair),
            self.buy_source.last_price(pair)
        )?;

        if cycles % CYCLE_LOG_EVERY == 1 {
            info!(
                cycle = cycles,
                sell_venue = self.sell_source.name(),
                sell_price = %sell_price,
                buy_venue = self.buy_source.name(),
                buy_price = %buy_price,
                "Prices sampled"
            );
        } else {
            debug!(sell_price = %sell_price, buy_price = %buy_price, "Prices sampled");
        }

        // Evaluation and fund accounting happen in one critical section;
        // the ledger write stays outside it.
        let mut opportunity_seen = false;
        let booked = {
            let mut state = self.state.lock().await;

            let Some(check) = domain::evaluate(
                sell_price,
                buy_price,
                self.cfg.min_spread_percent,
                &mut state.max_spread,
            ) else {
                debug!("No spread in the configured direction");
                return Ok(());
            };

            debug!(
                spread = %check.spread,
                spread_percent = %check.spread_percent,
                max_spread = %state.max_spread,
                "Spread evaluated"
            );

            if !check.opportunity {
                None
            } else if state.funds < self.cfg.trade_budget {
                opportunity_seen = true;
                debug!(
                    funds = %state.funds,
                    budget = %self.cfg.trade_budget,
                    "Opportunity skipped: insufficient simulated funds"
                );
                None
            } else {
                opportunity_seen = true;
                match domain::plan(
                    buy_price,
                    sell_price,
                    self.cfg.trade_budget,
                    self.cfg.fee_rate,
                ) {
                    Some(plan) => {
                        state.funds += plan.net_profit;
                        state.cumulative_profit += plan.net_profit;
                        info!(
                            profit = %plan.net_profit,
                            funds = %state.funds,
                            spread_percent = %check.spread_percent,
                            "Trade executed"
                        );
                        Some(NewTrade {
                            buy_exchange: self.buy_source.name().to_string(),
                            sell_exchange: self.sell_source.name().to_string(),
                            buy_price,
                            sell_price,
                            amount: plan.amount,
                            profit: plan.net_profit,
                        })
                    }
                    None => {
                        debug!("Opportunity skipped: net profit not positive");
                        None
                    }
                }
            }
        };

        {
            let mut stats = self.stats.lock().await;
            if opportunity_seen {
                stats.opportunities += 1;
            }
            if booked.is_some() {
                stats.trades_executed += 1;
            }
        }

        // The fund update above stands even when persistence fails; the
        // divergence is logged, never masked.
        if let Some(trade) = booked {
            if let Err(e) = self.ledger.insert(trade.clone()).await {
                error!(error = %e, profit = %trade.profit, "Failed to persist trade");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeRecord;
    use crate::exchanges;
    use crate::storage::StorageError;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    struct StaticSource {
        name: &'static str,
        price: Decimal,
    }

    #[async_trait]
    impl PriceSource for StaticSource {
        async fn last_price(&self, _pair: &str) -> exchanges::Result<Decimal> {
            Ok(self.price)
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct FailingSource {
        name: &'static str,
    }

    #[async_trait]
    impl PriceSource for FailingSource {
        async fn last_price(&self, _pair: &str) -> exchanges::Result<Decimal> {
            Err(QuoteError::Malformed("simulated outage".to_string()))
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[derive(Default)]
    struct MemoryLedger {
        trades: Mutex<Vec<TradeRecord>>,
    }

    #[async_trait]
    impl TradeLedger for MemoryLedger {
        async fn insert(&self, trade: NewTrade) -> Result<TradeRecord, StorageError> {
            let mut trades = self.trades.lock().await;
            let record = TradeRecord {
                id: trades.len() as i64 + 1,
                buy_exchange: trade.buy_exchange,
                sell_exchange: trade.sell_exchange,
                buy_price: trade.buy_price,
                sell_price: trade.sell_price,
                amount: trade.amount,
                profit: trade.profit,
                timestamp: Utc::now(),
            };
            trades.push(record.clone());
            Ok(record)
        }

        async fn recent(&self, limit: i64) -> Result<Vec<TradeRecord>, StorageError> {
            let trades = self.trades.lock().await;
            Ok(trades
                .iter()
                .rev()
                .take(limit.max(0) as usize)
                .cloned()
                .collect())
        }

        async fn count(&self) -> Result<i64, StorageError> {
            Ok(self.trades.lock().await.len() as i64)
        }

        async fn close(&self) -> Result<(), StorageError> {
            Ok(())
        }
    }

    struct FailingLedger;

    #[async_trait]
    impl TradeLedger for FailingLedger {
        async fn insert(&self, _trade: NewTrade) -> Result<TradeRecord, StorageError> {
            Err(StorageError::Io(std::io::Error::other(
                "simulated write failure",
            )))
        }

        async fn recent(&self, _limit: i64) -> Result<Vec<TradeRecord>, StorageError> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<i64, StorageError> {
            Ok(0)
        }

        async fn close(&self) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn test_config() -> TradingConfig {
        TradingConfig {
            pair: "BTC/USDT".to_string(),
            sell_venue: "binance".to_string(),
            buy_venue: "kucoin".to_string(),
            initial_funds: d("500"),
            trade_budget: d("200"),
            min_spread_percent: d("0.005"),
            fee_rate: Decimal::ZERO,
            poll_interval: Duration::from_millis(5),
            error_backoff: Duration::from_millis(2),
        }
    }

    fn test_bot(
        cfg: TradingConfig,
        sell_price: &str,
        buy_price: &str,
    ) -> (Arc<Bot>, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::default());
        let bot = Arc::new(Bot::new(
            cfg,
            Arc::new(StaticSource {
                name: "binance",
                price: d(sell_price),
            }),
            Arc::new(StaticSource {
                name: "kucoin",
                price: d(buy_price),
            }),
            ledger.clone(),
        ));
        (bot, ledger)
    }

    #[tokio::test]
    async fn test_cycle_books_profitable_trade() {
        let (bot, ledger) = test_bot(test_config(), "50100", "50000");

        bot.run_cycle().await.unwrap();

        let status = bot.status().await;
        assert_eq!(status.balance, d("500.4"));
        assert_eq!(status.profit, d("0.4"));
        assert_eq!(status.max_spread, d("0.2"));

        let trades = ledger.recent(10).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].buy_exchange, "kucoin");
        assert_eq!(trades[0].sell_exchange, "binance");
        assert_eq!(trades[0].buy_price, d("50000"));
        assert_eq!(trades[0].sell_price, d("50100"));
        assert_eq!(trades[0].amount, d("0.004"));
        assert_eq!(trades[0].profit, d("0.4"));

        let stats = bot.stats().await;
        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.opportunities, 1);
        assert_eq!(stats.trades_executed, 1);
    }

    #[tokio::test]
    async fn test_cycle_ignores_reverse_direction() {
        let (bot, ledger) = test_bot(test_config(), "50000", "50010");

        bot.run_cycle().await.unwrap();

        let status = bot.status().await;
        assert_eq!(status.balance, d("500"));
        assert_eq!(status.profit, Decimal::ZERO);
        assert_eq!(status.max_spread, Decimal::ZERO);
        assert_eq!(ledger.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cycle_below_threshold_still_tracks_max_spread() {
        let mut cfg = test_config();
        cfg.min_spread_percent = d("0.5");
        let (bot, ledger) = test_bot(cfg, "50100", "50000");

        bot.run_cycle().await.unwrap();

        let status = bot.status().await;
        assert_eq!(status.balance, d("500"));
        assert_eq!(status.max_spread, d("0.2"));
        assert_eq!(ledger.count().await.unwrap(), 0);

        let stats = bot.stats().await;
        assert_eq!(stats.opportunities, 0);
    }

    #[tokio::test]
    async fn test_cycle_skips_trade_on_insufficient_funds() {
        let mut cfg = test_config();
        cfg.initial_funds = d("100");
        let (bot, ledger) = test_bot(cfg, "50100", "50000");

        bot.run_cycle().await.unwrap();

        let status = bot.status().await;
        assert_eq!(status.balance, d("100"));
        assert_eq!(status.profit, Decimal::ZERO);
        assert_eq!(ledger.count().await.unwrap(), 0);

        let stats = bot.stats().await;
        assert_eq!(stats.opportunities, 1);
        assert_eq!(stats.trades_executed, 0);
    }

    #[tokio::test]
    async fn test_funds_invariant_across_cycles() {
        let (bot, _ledger) = test_bot(test_config(), "50100", "50000");

        for _ in 0..5 {
            bot.run_cycle().await.unwrap();
        }

        let status = bot.status().await;
        assert_eq!(status.balance, d("500") + status.profit);
        assert_eq!(status.profit, d("2.0"));
    }

    #[tokio::test]
    async fn test_quote_failure_leaves_state_untouched() {
        let ledger = Arc::new(MemoryLedger::default());
        let bot = Arc::new(Bot::new(
            test_config(),
            Arc::new(FailingSource { name: "binance" }),
            Arc::new(StaticSource {
                name: "kucoin",
                price: d("50000"),
            }),
            ledger.clone(),
        ));

        let result = bot.run_cycle().await;
        assert!(result.is_err());

        let status = bot.status().await;
        assert_eq!(status.balance, d("500"));
        assert_eq!(status.profit, Decimal::ZERO);
        assert_eq!(status.max_spread, Decimal::ZERO);
        assert_eq!(ledger.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ledger_failure_keeps_fund_update() {
        let bot = Arc::new(Bot::new(
            test_config(),
            Arc::new(StaticSource {
                name: "binance",
                price: d("50100"),
            }),
            Arc::new(StaticSource {
                name: "kucoin",
                price: d("50000"),
            }),
            Arc::new(FailingLedger),
        ));

        bot.run_cycle().await.unwrap();

        let status = bot.status().await;
        assert_eq!(status.balance, d("500.4"));
        assert_eq!(status.profit, d("0.4"));
    }

    #[tokio::test]
    async fn test_concurrent_starts_spawn_one_worker() {
        let (bot, _ledger) = test_bot(test_config(), "50000", "50000");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let bot = Arc::clone(&bot);
            handles.push(tokio::spawn(async move { bot.start().await }));
        }

        let mut started = 0;
        let mut already_running = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => started += 1,
                Err(BotError::AlreadyRunning) => already_running += 1,
            }
        }

        assert_eq!(started, 1);
        assert_eq!(already_running, 7);
        assert!(bot.is_running().await);

        bot.stop().await;
        bot.join().await;
        assert!(!bot.is_running().await);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (bot, _ledger) = test_bot(test_config(), "50000", "50000");

        bot.stop().await;
        bot.stop().await;
        assert!(!bot.is_running().await);

        bot.start().await.unwrap();
        bot.stop().await;
        bot.stop().await;
        bot.join().await;
        assert!(!bot.is_running().await);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (bot, _ledger) = test_bot(test_config(), "50000", "50000");

        bot.start().await.unwrap();
        bot.stop().await;
        bot.join().await;

        bot.start().await.unwrap();
        assert!(bot.is_running().await);

        bot.stop().await;
        bot.join().await;
    }

    #[tokio::test]
    async fn test_worker_executes_cycles() {
        let (bot, _ledger) = test_bot(test_config(), "50100", "50000");

        bot.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        bot.stop().await;
        bot.join().await;

        let stats = bot.stats().await;
        assert!(stats.cycles > 0);
        assert_eq!(stats.cycles, stats.trades_executed);

        let status = bot.status().await;
        assert_eq!(status.balance, d("500") + status.profit);
    }
}
