use super::ids::OrderId;
use super::order::Action;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broker settlement of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub symbol: String,
    pub action: Action,
    /// Requested price before slippage.
    pub requested_price: f64,
    /// Execution price after slippage.
    pub price: f64,
    pub quantity: f64,
    pub fee: f64,
    pub filled_at: DateTime<Utc>,
}

impl Fill {
    /// Dollar cost of slippage relative to the requested price.
    pub fn slippage_cost(&self) -> f64 {
        ((self.price - self.requested_price) * self.quantity).abs()
    }
}
