//! Trade — an immutable record of one executed fill.

use super::ids::{OrderId, TradeId};
use super::order::Action;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only entry in a portfolio's trade log.
///
/// Created only as a side effect of a Filled order; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    /// Execution price (slippage applied).
    pub price: f64,
    pub quantity: f64,
    pub action: Action,
    pub fee: f64,
    pub strategy: String,
    pub order_id: OrderId,
}

impl Trade {
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }

    /// Signed cash impact: negative for buys, positive for sells, fee included.
    pub fn cash_flow(&self) -> f64 {
        match self.action {
            Action::Buy => -(self.notional() + self.fee),
            Action::Sell => self.notional() - self.fee,
        }
    }
}
