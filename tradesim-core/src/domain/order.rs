//! Order types and the order-status state machine rules.

use super::ids::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
        }
    }
}

/// What kind of order was requested.
///
/// The simulated broker has no book to match against, so every type fills at
/// the requested price (adjusted for slippage). `Buy` and `Sell` are
/// side-tagged market orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    Buy,
    Sell,
}

impl OrderType {
    /// The side implied by the type, if any.
    pub fn implied_action(&self) -> Option<Action> {
        match self {
            OrderType::Buy => Some(Action::Buy),
            OrderType::Sell => Some(Action::Sell),
            OrderType::Market | OrderType::Limit | OrderType::Stop => None,
        }
    }
}

/// Order lifecycle states.
///
/// `New → {Filled, Canceled, Rejected}`, `Filled → Filled`, any → `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    Filled,
    Canceled,
    Rejected,
}

impl OrderStatus {
    pub fn can_execute(&self) -> bool {
        matches!(self, OrderStatus::New | OrderStatus::Filled)
    }

    pub fn can_cancel(&self) -> bool {
        *self == OrderStatus::New
    }

    /// Whether `self → to` is a legal transition.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        match to {
            OrderStatus::Filled => self.can_execute(),
            OrderStatus::Canceled => self.can_cancel(),
            OrderStatus::Rejected => true,
            OrderStatus::New => false,
        }
    }
}

/// A single order. Owned by the `OrderLedger`; everything else refers to it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub strategy_id: String,
    pub symbol: String,
    pub action: Action,
    pub quantity: f64,
    pub price: f64,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Audit trail entry for an order state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAuditEntry {
    pub order_id: OrderId,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub at: DateTime<Utc>,
}
