//! TradeSim Core — order lifecycle, broker simulation and portfolio accounting.
//!
//! This crate contains the simulation core:
//! - Domain types (bars, data points, orders, fills, positions, trades)
//! - Order ledger state machine with audit trail
//! - Fee model and simulated broker
//! - Portfolio facade with funds and valuation policies
//! - Indicators, preprocessing and the strategy contract

pub mod broker;
pub mod data;
pub mod domain;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod logger;
pub mod orders;
pub mod portfolio;
pub mod strategy;

pub use broker::Broker;
pub use error::{StrategyError, TradeError};
pub use execution::FeeModel;
pub use logger::{RecordingLogger, TracingLogger, TradeLogger};
pub use orders::OrderLedger;
pub use portfolio::{FundsPolicy, Portfolio, ValuationPolicy};
pub use strategy::Strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a parallel run moves across threads
    /// is Send, and everything shared between strategies is Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::DataPoint>();
        require_sync::<domain::DataPoint>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();

        // Simulation state owned by one strategy's unit of work
        require_send::<OrderLedger>();
        require_send::<Broker>();
        require_send::<Portfolio>();

        // Shared read-only or internally synchronized
        require_send::<FeeModel>();
        require_sync::<FeeModel>();
        require_send::<RecordingLogger>();
        require_sync::<RecordingLogger>();
        require_send::<std::sync::Arc<dyn TradeLogger>>();
        require_sync::<std::sync::Arc<dyn TradeLogger>>();

        // Strategies
        require_send::<Box<dyn Strategy>>();
        require_send::<strategy::MacdCrossover>();
        require_send::<strategy::RsiReversion>();
        require_send::<strategy::ThresholdStrategy>();
    }

    /// Architecture contract: strategies reach the market only through the
    /// portfolio they are handed; there is no broker parameter.
    #[test]
    fn strategy_trait_takes_portfolio_not_broker() {
        fn _check_trait_object_builds(
            s: &mut dyn Strategy,
            points: &[domain::DataPoint],
            portfolio: &mut Portfolio,
        ) -> Result<(), StrategyError> {
            s.on_data(points, portfolio)
        }
    }
}
