//! Order ledger — the single source of truth for order status.
//!
//! The ledger manages:
//! - Order creation with quantity validation and sequential IDs
//! - State transitions (New → Filled / Canceled / Rejected, Filled → Filled)
//! - Audit trail for every transition
//!
//! The ledger does NOT price fills or move cash. `execute_order` hands the
//! order to a settlement closure supplied by the broker and records the
//! outcome.

use crate::domain::{
    Action, IdGen, Order, OrderAuditEntry, OrderId, OrderStatus, OrderType,
};
use crate::error::TradeError;
use chrono::Utc;
use std::collections::HashMap;

/// Outcome of a successful `execute_order` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// The order was New and has now been settled.
    Filled,
    /// The order was already Filled; nothing was settled again.
    AlreadyFilled,
}

/// Registry of all orders created by one broker.
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: HashMap<OrderId, Order>,
    /// Ids in creation order.
    sequence: Vec<OrderId>,
    id_gen: IdGen,
    audit_trail: Vec<OrderAuditEntry>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Public API ─────────────────────────────────────────────────────

    /// Create an order in status `New`.
    pub fn create_order(
        &mut self,
        strategy_id: &str,
        symbol: &str,
        action: Action,
        quantity: f64,
        price: f64,
        order_type: OrderType,
    ) -> Result<OrderId, TradeError> {
        if !(quantity > 0.0) || !quantity.is_finite() {
            return Err(TradeError::InvalidQuantity(quantity));
        }
        if !(price > 0.0) || !price.is_finite() {
            return Err(TradeError::InvalidPrice(price));
        }
        debug_assert!(
            order_type.implied_action().map_or(true, |a| a == action),
            "order type {order_type:?} conflicts with action {action:?}"
        );

        let id = OrderId::sequential(self.id_gen.next_id());
        let now = Utc::now();
        let order = Order {
            id: id.clone(),
            strategy_id: strategy_id.to_string(),
            symbol: symbol.to_string(),
            action,
            quantity,
            price,
            order_type,
            status: OrderStatus::New,
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(id.clone(), order);
        self.sequence.push(id.clone());
        self.audit_trail.push(OrderAuditEntry {
            order_id: id.clone(),
            from_status: None,
            to_status: OrderStatus::New,
            at: now,
        });
        Ok(id)
    }

    /// Execute an order through `settle`.
    ///
    /// - Unknown id → `OrderNotFound`
    /// - Canceled/Rejected → `InvalidTransition`
    /// - Already Filled → restamped, `settle` is not called again
    /// - `settle` fails → order becomes Rejected and the error is returned
    /// - `settle` succeeds → order becomes Filled
    pub fn execute_order<F>(&mut self, id: &OrderId, settle: F) -> Result<Execution, TradeError>
    where
        F: FnOnce(&Order) -> Result<(), TradeError>,
    {
        let order = self
            .orders
            .get(id)
            .ok_or_else(|| TradeError::OrderNotFound(id.clone()))?;

        if !order.status.can_execute() {
            return Err(TradeError::InvalidTransition {
                id: id.clone(),
                from: order.status,
                to: OrderStatus::Filled,
            });
        }

        if order.status == OrderStatus::Filled {
            self.transition(id, OrderStatus::Filled)?;
            return Ok(Execution::AlreadyFilled);
        }

        match settle(order) {
            Ok(()) => {
                self.transition(id, OrderStatus::Filled)?;
                Ok(Execution::Filled)
            }
            Err(err) => {
                self.transition(id, OrderStatus::Rejected)?;
                Err(err)
            }
        }
    }

    /// Cancel an order. Only `New` orders can be canceled.
    pub fn cancel_order(&mut self, id: &OrderId) -> Result<(), TradeError> {
        let order = self
            .orders
            .get(id)
            .ok_or_else(|| TradeError::OrderNotFound(id.clone()))?;

        if !order.status.can_cancel() {
            return Err(TradeError::CannotCancel {
                id: id.clone(),
                status: order.status,
            });
        }
        self.transition(id, OrderStatus::Canceled)
    }

    /// Reject an order from any state (broker-side failure).
    pub fn reject_order(&mut self, id: &OrderId) -> Result<(), TradeError> {
        self.transition(id, OrderStatus::Rejected)
    }

    /// Get an order by ID.
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Current status of an order.
    pub fn status(&self, id: &OrderId) -> Result<OrderStatus, TradeError> {
        self.get(id)
            .map(|o| o.status)
            .ok_or_else(|| TradeError::OrderNotFound(id.clone()))
    }

    /// All orders created by a strategy, in creation order.
    pub fn orders_for_strategy(&self, strategy_id: &str) -> Vec<&Order> {
        self.sequence
            .iter()
            .filter_map(|id| self.orders.get(id))
            .filter(|o| o.strategy_id == strategy_id)
            .collect()
    }

    /// Get the full audit trail.
    pub fn audit_trail(&self) -> &[OrderAuditEntry] {
        &self.audit_trail
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    // ── Internal helpers ───────────────────────────────────────────────

    /// Apply a transition, enforcing the state machine and stamping `updated_at`.
    fn transition(&mut self, id: &OrderId, to: OrderStatus) -> Result<(), TradeError> {
        let order = self
            .orders
            .get_mut(id)
            .ok_or_else(|| TradeError::OrderNotFound(id.clone()))?;

        let from = order.status;
        if !from.can_transition_to(to) {
            return Err(match to {
                OrderStatus::Canceled => TradeError::CannotCancel {
                    id: id.clone(),
                    status: from,
                },
                _ => TradeError::InvalidTransition {
                    id: id.clone(),
                    from,
                    to,
                },
            });
        }

        let now = Utc::now();
        order.status = to;
        order.updated_at = now;
        self.audit_trail.push(OrderAuditEntry {
            order_id: id.clone(),
            from_status: Some(from),
            to_status: to,
            at: now,
        });
        Ok(())
    }
}
