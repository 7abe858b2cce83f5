//! Simulated broker — settles ledger orders against an account and position map.
//!
//! The broker owns:
//! - the `OrderLedger` (order status)
//! - the `FeeModel` (execution price and fees)
//! - the `Account` (cash, equity, balance)
//! - one `Position` per symbol ever traded
//!
//! Settlement is synchronous and deterministic: no randomness, no partial fills.

use crate::domain::{Account, Action, Fill, Order, OrderId, OrderStatus, OrderType, Position};
use crate::error::TradeError;
use crate::execution::FeeModel;
use crate::orders::{Execution, OrderLedger};
use chrono::Utc;
use std::collections::HashMap;

const QTY_EPSILON: f64 = 1e-9;

#[derive(Debug)]
pub struct Broker {
    ledger: OrderLedger,
    fees: FeeModel,
    account: Account,
    positions: HashMap<String, Position>,
}

impl Broker {
    pub fn new(initial_cash: f64, fees: FeeModel) -> Self {
        Self {
            ledger: OrderLedger::new(),
            fees,
            account: Account::new(initial_cash),
            positions: HashMap::new(),
        }
    }

    // ── Orders ─────────────────────────────────────────────────────────

    pub fn create_order(
        &mut self,
        strategy_id: &str,
        symbol: &str,
        action: Action,
        quantity: f64,
        price: f64,
        order_type: OrderType,
    ) -> Result<OrderId, TradeError> {
        self.ledger
            .create_order(strategy_id, symbol, action, quantity, price, order_type)
    }

    /// Execute an order.
    ///
    /// Returns `Some(fill)` when the order settled now, `None` when it was
    /// already Filled. On any settlement failure the order is Rejected and
    /// account/positions are left untouched.
    pub fn execute_order(&mut self, id: &OrderId) -> Result<Option<Fill>, TradeError> {
        let fees = &self.fees;
        let account = &mut self.account;
        let positions = &mut self.positions;
        let mut fill = None;

        let outcome = self.ledger.execute_order(id, |order| {
            fill = Some(settle(fees, account, positions, order)?);
            Ok(())
        })?;

        match outcome {
            Execution::Filled => Ok(fill),
            Execution::AlreadyFilled => Ok(None),
        }
    }

    pub fn cancel_order(&mut self, id: &OrderId) -> Result<(), TradeError> {
        self.ledger.cancel_order(id)
    }

    pub fn order_status(&self, id: &OrderId) -> Result<OrderStatus, TradeError> {
        self.ledger.status(id)
    }

    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.ledger.get(id)
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    // ── Account & positions ────────────────────────────────────────────

    pub fn fee_model(&self) -> &FeeModel {
        &self.fees
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn cash(&self) -> f64 {
        self.account.cash
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    /// Held quantity for `symbol`, zero if never traded.
    pub fn quantity(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).map_or(0.0, |p| p.quantity)
    }

    /// Revalue an existing position at `price` and refresh account equity.
    pub fn mark(&mut self, symbol: &str, price: f64) {
        if let Some(pos) = self.positions.get_mut(symbol) {
            pos.mark(price);
            refresh_account(&mut self.account, &self.positions);
        }
    }
}

// ── Settlement ─────────────────────────────────────────────────────────

fn settle(
    fees: &FeeModel,
    account: &mut Account,
    positions: &mut HashMap<String, Position>,
    order: &Order,
) -> Result<Fill, TradeError> {
    let (exec_price, fee) = fees.quote(order.action, order.price, order.quantity);
    let gross = exec_price * order.quantity;

    match order.action {
        Action::Buy => {
            let required = gross + fee;
            if account.cash < required {
                return Err(TradeError::InsufficientFunds {
                    required,
                    available: account.cash,
                });
            }
            account.cash -= required;
        }
        Action::Sell => {
            let held = positions.get(&order.symbol).map_or(0.0, |p| p.quantity);
            if order.quantity > held + QTY_EPSILON {
                return Err(TradeError::InsufficientPosition {
                    symbol: order.symbol.clone(),
                    requested: order.quantity,
                    held,
                });
            }
            // A fixed fee can exceed tiny proceeds; cash never goes negative.
            if account.cash + gross < fee {
                return Err(TradeError::InsufficientFunds {
                    required: fee - gross,
                    available: account.cash,
                });
            }
            account.cash += gross - fee;
        }
    }

    positions
        .entry(order.symbol.clone())
        .or_insert_with(|| Position::new(order.symbol.clone()))
        .update(exec_price, order.quantity, order.action);
    refresh_account(account, positions);

    Ok(Fill {
        order_id: order.id.clone(),
        symbol: order.symbol.clone(),
        action: order.action,
        requested_price: order.price,
        price: exec_price,
        quantity: order.quantity,
        fee,
        filled_at: Utc::now(),
    })
}

/// `equity = cash + Σ market value`, `balance = cash + Σ cost basis`.
fn refresh_account(account: &mut Account, positions: &HashMap<String, Position>) {
    let (market, cost) = positions.values().fold((0.0, 0.0), |(m, c), p| {
        (m + p.market_value, c + p.avg_price * p.quantity)
    });
    account.equity = account.cash + market;
    account.balance = account.cash + cost;
}
