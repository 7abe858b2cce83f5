//! Strategy contract and reference strategies.
//!
//! A strategy sees market data only through `on_data` and trades only
//! through the `Portfolio` it is handed. `calculate` and `run` are pure
//! analysis paths with no portfolio side effects.

pub mod macd_crossover;
pub mod rsi_reversion;
pub mod threshold;

pub use macd_crossover::MacdCrossover;
pub use rsi_reversion::RsiReversion;
pub use threshold::ThresholdStrategy;

use crate::domain::{Bar, DataPoint, Signal, Trade};
use crate::error::{StrategyError, TradeError};
use crate::portfolio::Portfolio;
use std::collections::BTreeMap;

pub trait Strategy: Send {
    fn name(&self) -> &str;

    fn on_start(&mut self, _portfolio: &mut Portfolio) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Handle every data point sharing one timestamp, in symbol order.
    fn on_data(
        &mut self,
        points: &[DataPoint],
        portfolio: &mut Portfolio,
    ) -> Result<(), StrategyError>;

    /// Called once per traded symbol after the data is exhausted.
    ///
    /// Closes the symbol's position at its last known price.
    fn on_end(&mut self, portfolio: &mut Portfolio, symbol: &str) -> Result<(), StrategyError> {
        if let Some(time) = portfolio.last_mark_time() {
            portfolio.close_position(symbol, time)?;
        }
        Ok(())
    }

    /// Indicator series for reporting, keyed by name.
    fn calculate(&self, bars: &[Bar]) -> BTreeMap<String, Vec<f64>>;

    /// One optional signal per bar over a single series.
    fn run(&self, bars: &[Bar]) -> Vec<Option<Signal>>;
}

/// Treat funds/holdings rejections as a skipped trade; propagate anything else.
pub(crate) fn skip_rejection(
    strategy: &str,
    result: Result<Option<Trade>, TradeError>,
) -> Result<Option<Trade>, StrategyError> {
    match result {
        Ok(trade) => Ok(trade),
        Err(err) if err.is_rejection() => {
            tracing::debug!(strategy, error = %err, "trade rejected");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn check_quantity(quantity: f64) -> Result<(), StrategyError> {
    if quantity > 0.0 && quantity.is_finite() {
        Ok(())
    } else {
        Err(StrategyError::InvalidParameter(format!(
            "quantity must be > 0, got {quantity}"
        )))
    }
}
