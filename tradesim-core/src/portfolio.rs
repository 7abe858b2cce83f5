//! Portfolio — the accounting facade strategies trade through.
//!
//! Cash and positions live in the portfolio's own `Broker`; the portfolio adds
//! the append-only trade log, per-symbol price memory for valuation, and the
//! funds/valuation policies. Prices only ever arrive as parameters.

use crate::broker::Broker;
use crate::domain::{Action, DataPoint, IdGen, OrderType, Position, Trade, TradeId};
use crate::error::TradeError;
use crate::execution::FeeModel;
use crate::logger::TradeLogger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What `buy` does when the estimated cost exceeds available cash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundsPolicy {
    /// Return `Ok(None)` without creating an order.
    #[default]
    Skip,
    /// Create the order and propagate the broker's `InsufficientFunds`.
    Reject,
}

/// How held positions are valued in [`Portfolio::value`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationPolicy {
    /// Quantity × this portfolio's last execution price for the symbol.
    #[default]
    LastTrade,
    /// Quantity × the latest price passed to `mark_price`, falling back to
    /// the last trade price for symbols never marked.
    MarkToMarket,
    /// Quantity × average cost.
    CostBasis,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PriceMark {
    time: DateTime<Utc>,
    price: f64,
}

pub struct Portfolio {
    strategy: String,
    initial_cash: f64,
    broker: Broker,
    trades: Vec<Trade>,
    trade_ids: IdGen,
    last_trade_prices: HashMap<String, f64>,
    marks: HashMap<String, PriceMark>,
    funds_policy: FundsPolicy,
    valuation: ValuationPolicy,
    logger: Option<Arc<dyn TradeLogger>>,
}

impl fmt::Debug for Portfolio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Portfolio")
            .field("strategy", &self.strategy)
            .field("initial_cash", &self.initial_cash)
            .field("cash", &self.broker.cash())
            .field("trades", &self.trades.len())
            .field("funds_policy", &self.funds_policy)
            .field("valuation", &self.valuation)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Portfolio {
    pub fn new(strategy: impl Into<String>, initial_cash: f64, fees: FeeModel) -> Self {
        Self {
            strategy: strategy.into(),
            initial_cash,
            broker: Broker::new(initial_cash, fees),
            trades: Vec::new(),
            trade_ids: IdGen::default(),
            last_trade_prices: HashMap::new(),
            marks: HashMap::new(),
            funds_policy: FundsPolicy::default(),
            valuation: ValuationPolicy::default(),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn TradeLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_funds_policy(mut self, policy: FundsPolicy) -> Self {
        self.funds_policy = policy;
        self
    }

    pub fn with_valuation(mut self, policy: ValuationPolicy) -> Self {
        self.valuation = policy;
        self
    }

    // ── Trading ────────────────────────────────────────────────────────

    /// Buy `quantity` of `symbol` at `price`.
    ///
    /// Under [`FundsPolicy::Skip`] an unaffordable buy returns `Ok(None)` and
    /// leaves no trace in the ledger. Under [`FundsPolicy::Reject`] the order
    /// is created, rejected by the broker, and the error is returned.
    pub fn buy(
        &mut self,
        symbol: &str,
        time: DateTime<Utc>,
        price: f64,
        quantity: f64,
    ) -> Result<Option<Trade>, TradeError> {
        if self.funds_policy == FundsPolicy::Skip && quantity > 0.0 {
            let required = self.broker.fee_model().buy_cost(price, quantity);
            let available = self.broker.cash();
            if required > available {
                tracing::debug!(
                    strategy = %self.strategy,
                    symbol,
                    required,
                    available,
                    "buy skipped: insufficient funds"
                );
                return Ok(None);
            }
        }
        self.place(symbol, time, Action::Buy, price, quantity)
    }

    /// Sell `quantity` of `symbol` at `price`.
    ///
    /// Fails with `InsufficientPosition` before any order is created when
    /// holdings are short.
    pub fn sell(
        &mut self,
        symbol: &str,
        time: DateTime<Utc>,
        price: f64,
        quantity: f64,
    ) -> Result<Option<Trade>, TradeError> {
        let held = self.position_size(symbol);
        if quantity > held {
            return Err(TradeError::InsufficientPosition {
                symbol: symbol.to_string(),
                requested: quantity,
                held,
            });
        }
        self.place(symbol, time, Action::Sell, price, quantity)
    }

    /// Sell the whole holding of `symbol` at its last known price.
    ///
    /// Returns `Ok(None)` when flat.
    pub fn close_position(
        &mut self,
        symbol: &str,
        time: DateTime<Utc>,
    ) -> Result<Option<Trade>, TradeError> {
        let Some(pos) = self.broker.position(symbol).filter(|p| !p.is_flat()) else {
            return Ok(None);
        };
        let (quantity, avg_price) = (pos.quantity, pos.avg_price);
        let price = self.last_price(symbol).unwrap_or(avg_price);
        self.sell(symbol, time, price, quantity)
    }

    /// Close every open position, in symbol order.
    pub fn close_all_positions(&mut self, time: DateTime<Utc>) -> Result<Vec<Trade>, TradeError> {
        let mut symbols: Vec<String> = self
            .broker
            .positions()
            .values()
            .filter(|p| !p.is_flat())
            .map(|p| p.symbol.clone())
            .collect();
        symbols.sort();

        let mut closed = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(trade) = self.close_position(&symbol, time)? {
                closed.push(trade);
            }
        }
        Ok(closed)
    }

    /// Record an observed market price without trading.
    pub fn mark_price(&mut self, symbol: &str, time: DateTime<Utc>, price: f64) {
        self.marks
            .insert(symbol.to_string(), PriceMark { time, price });
        self.broker.mark(symbol, price);
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Cash plus held positions valued under the configured policy.
    pub fn value(&self) -> f64 {
        let holdings: f64 = self
            .broker
            .positions()
            .values()
            .filter(|p| !p.is_flat())
            .map(|p| p.quantity * self.valuation_price(p))
            .sum();
        self.broker.cash() + holdings
    }

    pub fn available_cash(&self) -> f64 {
        self.broker.cash()
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn position_size(&self, symbol: &str) -> f64 {
        self.broker.quantity(symbol)
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        self.broker.positions()
    }

    /// The append-only trade log, oldest first.
    pub fn transactions(&self) -> &[Trade] {
        &self.trades
    }

    /// Latest marked price, else last execution price.
    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.marks
            .get(symbol)
            .map(|m| m.price)
            .or_else(|| self.last_trade_prices.get(symbol).copied())
    }

    /// Time of the latest mark across all symbols.
    pub fn last_mark_time(&self) -> Option<DateTime<Utc>> {
        self.marks.values().map(|m| m.time).max()
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn funds_policy(&self) -> FundsPolicy {
        self.funds_policy
    }

    pub fn valuation(&self) -> ValuationPolicy {
        self.valuation
    }

    // ── Logger notifications ───────────────────────────────────────────

    pub fn notify_data(&self, point: &DataPoint) {
        if let Some(logger) = &self.logger {
            logger.log_data(point);
        }
    }

    pub fn notify_end(&self) {
        if let Some(logger) = &self.logger {
            logger.log_end(self);
        }
    }

    // ── Internal helpers ───────────────────────────────────────────────

    fn place(
        &mut self,
        symbol: &str,
        time: DateTime<Utc>,
        action: Action,
        price: f64,
        quantity: f64,
    ) -> Result<Option<Trade>, TradeError> {
        let order_type = match action {
            Action::Buy => OrderType::Buy,
            Action::Sell => OrderType::Sell,
        };
        let order_id = self.broker.create_order(
            &self.strategy,
            symbol,
            action,
            quantity,
            price,
            order_type,
        )?;
        let Some(fill) = self.broker.execute_order(&order_id)? else {
            return Ok(None);
        };

        let trade = Trade {
            id: TradeId::sequential(self.trade_ids.next_id()),
            timestamp: time,
            symbol: symbol.to_string(),
            price: fill.price,
            quantity: fill.quantity,
            action,
            fee: fill.fee,
            strategy: self.strategy.clone(),
            order_id,
        };
        self.last_trade_prices.insert(symbol.to_string(), fill.price);
        self.trades.push(trade.clone());
        if let Some(logger) = &self.logger {
            logger.log_trade(&trade);
        }
        Ok(Some(trade))
    }

    fn valuation_price(&self, pos: &Position) -> f64 {
        let last_trade = self.last_trade_prices.get(&pos.symbol).copied();
        match self.valuation {
            ValuationPolicy::LastTrade => last_trade.unwrap_or(pos.avg_price),
            ValuationPolicy::MarkToMarket => self
                .marks
                .get(&pos.symbol)
                .map(|m| m.price)
                .or(last_trade)
                .unwrap_or(pos.avg_price),
            ValuationPolicy::CostBasis => pos.avg_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, day, 0, 0, 0).unwrap()
    }

    fn frictionless(cash: f64) -> Portfolio {
        Portfolio::new("test", cash, FeeModel::frictionless())
    }

    #[test]
    fn buy_then_sell_round_trip() {
        let mut p = frictionless(100_000.0);
        p.buy("CMB", t(1), 50.0, 100.0).unwrap().unwrap();
        assert_eq!(p.available_cash(), 95_000.0);
        assert_eq!(p.position_size("CMB"), 100.0);
        p.sell("CMB", t(2), 60.0, 100.0).unwrap().unwrap();
        assert_eq!(p.available_cash(), 101_000.0);
        assert_eq!(p.position_size("CMB"), 0.0);
        assert_eq!(p.transactions().len(), 2);
        assert_eq!(p.transactions()[0].action, Action::Buy);
        assert_eq!(p.transactions()[1].action, Action::Sell);
    }

    #[test]
    fn skip_policy_leaves_no_order() {
        let mut p = frictionless(1_000.0);
        assert_eq!(p.buy("CMB", t(1), 50.0, 100.0).unwrap(), None);
        assert!(p.broker().ledger().is_empty());
        assert_eq!(p.available_cash(), 1_000.0);
        assert!(p.transactions().is_empty());
    }

    #[test]
    fn reject_policy_propagates_and_rejects_order() {
        let mut p = frictionless(1_000.0).with_funds_policy(FundsPolicy::Reject);
        let err = p.buy("CMB", t(1), 50.0, 100.0).unwrap_err();
        assert!(matches!(err, TradeError::InsufficientFunds { .. }));
        assert_eq!(p.broker().ledger().len(), 1);
        assert_eq!(p.available_cash(), 1_000.0);
        assert!(p.transactions().is_empty());
    }

    #[test]
    fn oversell_fails_before_order_creation() {
        let mut p = frictionless(10_000.0);
        p.buy("CMB", t(1), 10.0, 5.0).unwrap();
        let err = p.sell("CMB", t(2), 10.0, 6.0).unwrap_err();
        assert!(matches!(err, TradeError::InsufficientPosition { .. }));
        assert_eq!(p.broker().ledger().len(), 1);
        assert_eq!(p.position_size("CMB"), 5.0);
        assert_eq!(p.available_cash(), 9_950.0);
    }

    #[test]
    fn invalid_quantity_surfaces() {
        let mut p = frictionless(10_000.0);
        assert!(matches!(
            p.buy("CMB", t(1), 10.0, 0.0),
            Err(TradeError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn value_policies() {
        let mut p = frictionless(10_000.0);
        p.buy("CMB", t(1), 50.0, 10.0).unwrap();
        p.mark_price("CMB", t(2), 80.0);
        // last trade: 9_500 + 10 * 50
        assert_eq!(p.value(), 10_000.0);

        let mut m = frictionless(10_000.0).with_valuation(ValuationPolicy::MarkToMarket);
        m.buy("CMB", t(1), 50.0, 10.0).unwrap();
        assert_eq!(m.value(), 10_000.0);
        m.mark_price("CMB", t(2), 80.0);
        assert_eq!(m.value(), 10_300.0);

        let mut c = frictionless(10_000.0).with_valuation(ValuationPolicy::CostBasis);
        c.buy("CMB", t(1), 50.0, 10.0).unwrap();
        c.buy("CMB", t(2), 70.0, 10.0).unwrap();
        // 8_800 cash + 20 * 60 avg
        assert_eq!(c.value(), 10_000.0);
    }

    #[test]
    fn close_all_positions_uses_last_price() {
        let mut p = frictionless(10_000.0);
        p.buy("AAA", t(1), 10.0, 10.0).unwrap();
        p.buy("BBB", t(1), 20.0, 10.0).unwrap();
        p.mark_price("AAA", t(2), 12.0);
        let closed = p.close_all_positions(t(3)).unwrap();
        assert_eq!(closed.len(), 2);
        assert_eq!(closed[0].symbol, "AAA");
        assert_eq!(closed[0].price, 12.0);
        assert_eq!(closed[1].price, 20.0);
        assert_eq!(p.available_cash(), 10_020.0);
        assert!(p.close_position("AAA", t(4)).unwrap().is_none());
        assert_eq!(p.last_mark_time(), Some(t(2)));
    }

    #[test]
    fn trade_ids_are_sequential() {
        let mut p = frictionless(10_000.0);
        p.buy("CMB", t(1), 1.0, 1.0).unwrap();
        p.buy("CMB", t(2), 1.0, 1.0).unwrap();
        let ids: Vec<_> = p.transactions().iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, vec!["TRD-000001", "TRD-000002"]);
    }
}
