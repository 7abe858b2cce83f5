//! Error taxonomy for the simulation core.
//!
//! `TradeError` covers domain-state outcomes: a rejected buy or an invalid
//! order transition is an expected result of normal operation, not a bug.
//! `StrategyError` wraps data problems raised by strategy collaborators.

use crate::domain::{OrderId, OrderStatus};
use thiserror::Error;

/// Errors from the order ledger, broker and portfolio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeError {
    #[error("invalid quantity {0}: must be > 0")]
    InvalidQuantity(f64),

    #[error("invalid price {0}: must be finite and > 0")]
    InvalidPrice(f64),

    #[error("insufficient funds: required {required:.2}, available {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient position in {symbol}: requested {requested}, held {held}")]
    InsufficientPosition {
        symbol: String,
        requested: f64,
        held: f64,
    },

    #[error("invalid state transition for order {id}: {from:?} → {to:?}")]
    InvalidTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("order {id} cannot be canceled (status: {status:?})")]
    CannotCancel { id: OrderId, status: OrderStatus },

    #[error("order {0} not found")]
    OrderNotFound(OrderId),
}

impl TradeError {
    /// Whether this is an ordinary broker-side rejection a strategy may
    /// simply skip (funds, holdings) rather than a misuse of the API.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TradeError::InsufficientFunds { .. } | TradeError::InsufficientPosition { .. }
        )
    }
}

/// Errors raised by strategy collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("insufficient data: need {needed} bars, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("indicator '{0}' missing from data point")]
    MissingIndicator(String),

    #[error("invalid strategy parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Trade(#[from] TradeError),
}
