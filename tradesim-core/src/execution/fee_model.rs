//! Fee model — stamp duty, commission, fixed fee and slippage.
//!
//! Slippage is directional: buyers pay more, sellers receive less.
//! Stamp duty is charged on the buy side only. The fixed fee applies to
//! every fill regardless of size.

use crate::domain::Action;
use serde::{Deserialize, Serialize};

/// Immutable execution-cost configuration, shared read-only across strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeModel {
    /// Fraction of notional charged on buys.
    pub stamp_duty: f64,
    /// Fraction of notional charged on both sides.
    pub commission: f64,
    /// Flat amount added to every fill.
    pub fixed_fee: f64,
    /// Fractional adverse price move applied at execution.
    pub slippage: f64,
    /// Advisory lot size; see [`FeeModel::round_to_lot`].
    pub min_lot_size: f64,
}

impl Default for FeeModel {
    fn default() -> Self {
        Self {
            stamp_duty: 0.001,
            commission: 0.0003,
            fixed_fee: 5.0,
            slippage: 0.0005,
            min_lot_size: 1.0,
        }
    }
}

impl FeeModel {
    /// No fees and no slippage.
    pub fn frictionless() -> Self {
        Self {
            stamp_duty: 0.0,
            commission: 0.0,
            fixed_fee: 0.0,
            slippage: 0.0,
            min_lot_size: 1.0,
        }
    }

    /// Fee for a fill of `quantity` at `price`.
    ///
    /// `buy:  notional × (stamp_duty + commission) + fixed_fee`
    /// `sell: notional × commission + fixed_fee`
    pub fn fee(&self, action: Action, price: f64, quantity: f64) -> f64 {
        let notional = price * quantity;
        let rate = match action {
            Action::Buy => self.stamp_duty + self.commission,
            Action::Sell => self.commission,
        };
        notional * rate + self.fixed_fee
    }

    /// Slippage-adjusted execution price. Always adverse to the trader.
    pub fn execution_price(&self, action: Action, price: f64) -> f64 {
        match action {
            Action::Buy => price * (1.0 + self.slippage),
            Action::Sell => price * (1.0 - self.slippage),
        }
    }

    /// Execution price and fee together; the fee is charged on the
    /// slippage-adjusted notional.
    pub fn quote(&self, action: Action, price: f64, quantity: f64) -> (f64, f64) {
        let exec = self.execution_price(action, price);
        (exec, self.fee(action, exec, quantity))
    }

    /// Total cash needed to buy `quantity` at `price`, fee included.
    pub fn buy_cost(&self, price: f64, quantity: f64) -> f64 {
        let (exec, fee) = self.quote(Action::Buy, price, quantity);
        exec * quantity + fee
    }

    /// Round `quantity` down to a whole number of lots.
    ///
    /// Not applied by the broker; strategies call this when sizing.
    pub fn round_to_lot(&self, quantity: f64) -> f64 {
        if self.min_lot_size <= 0.0 {
            return quantity;
        }
        (quantity / self.min_lot_size).floor() * self.min_lot_size
    }

    /// Whether every rate is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [
            self.stamp_duty,
            self.commission,
            self.fixed_fee,
            self.slippage,
            self.min_lot_size,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
            && self.slippage < 1.0
    }
}
