//! Trade logging collaborator.
//!
//! A `TradeLogger` is injected into each `Portfolio` as `Arc<dyn TradeLogger>`.
//! The same logger may be shared by every strategy of a parallel run, so
//! implementations must be `Send + Sync` and serialize their own state.

use crate::domain::{DataPoint, Trade};
use crate::portfolio::Portfolio;
use std::sync::{Mutex, MutexGuard};

/// Fire-and-forget notifications from the simulation.
pub trait TradeLogger: Send + Sync {
    fn log_trade(&self, trade: &Trade);

    fn log_data(&self, _point: &DataPoint) {}

    fn log_end(&self, portfolio: &Portfolio);
}

/// Forwards every notification to `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl TradeLogger for TracingLogger {
    fn log_trade(&self, trade: &Trade) {
        tracing::info!(
            strategy = %trade.strategy,
            symbol = %trade.symbol,
            action = trade.action.as_str(),
            price = trade.price,
            quantity = trade.quantity,
            fee = trade.fee,
            order_id = %trade.order_id,
            "trade"
        );
    }

    fn log_data(&self, point: &DataPoint) {
        tracing::trace!(
            symbol = %point.symbol,
            time = %point.time,
            close = point.close,
            "data"
        );
    }

    fn log_end(&self, portfolio: &Portfolio) {
        tracing::info!(
            strategy = portfolio.strategy_name(),
            value = portfolio.value(),
            cash = portfolio.available_cash(),
            trades = portfolio.transactions().len(),
            "end"
        );
    }
}

/// End-of-run summary captured by [`RecordingLogger`].
#[derive(Debug, Clone, PartialEq)]
pub struct EndRecord {
    pub strategy: String,
    pub value: f64,
    pub trades: usize,
}

#[derive(Debug, Default)]
struct Recorded {
    trades: Vec<Trade>,
    data_points: usize,
    ends: Vec<EndRecord>,
}

/// In-memory logger, safe to share across concurrently running strategies.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    inner: Mutex<Recorded>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic in another strategy must not take the audit down with it.
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn trades(&self) -> Vec<Trade> {
        self.lock().trades.clone()
    }

    pub fn data_points(&self) -> usize {
        self.lock().data_points
    }

    pub fn ends(&self) -> Vec<EndRecord> {
        self.lock().ends.clone()
    }
}

impl TradeLogger for RecordingLogger {
    fn log_trade(&self, trade: &Trade) {
        self.lock().trades.push(trade.clone());
    }

    fn log_data(&self, _point: &DataPoint) {
        self.lock().data_points += 1;
    }

    fn log_end(&self, portfolio: &Portfolio) {
        self.lock().ends.push(EndRecord {
            strategy: portfolio.strategy_name().to_string(),
            value: portfolio.value(),
            trades: portfolio.transactions().len(),
        });
    }
}
