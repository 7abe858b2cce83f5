use super::order::Action;
use serde::{Deserialize, Serialize};

/// Long-only position tracked with a running average cost basis.
///
/// Never removed from the broker's map once created; quantity may return to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: 0.0,
            avg_price: 0.0,
            market_value: 0.0,
            unrealized_pnl: 0.0,
            realized_pnl: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.abs() < 1e-10
    }

    /// Apply a fill at `price` for `quantity`.
    ///
    /// Sells must not exceed the held quantity; the caller checks holdings first.
    pub fn update(&mut self, price: f64, quantity: f64, action: Action) {
        match action {
            Action::Buy => {
                let total_qty = self.quantity + quantity;
                if total_qty > 0.0 {
                    self.avg_price = (self.avg_price * self.quantity + price * quantity) / total_qty;
                }
                self.quantity = total_qty;
            }
            Action::Sell => {
                debug_assert!(
                    quantity <= self.quantity + 1e-10,
                    "sell of {quantity} exceeds held {}",
                    self.quantity
                );
                self.realized_pnl += (price - self.avg_price) * quantity;
                self.quantity -= quantity;
                if self.is_flat() {
                    self.quantity = 0.0;
                }
            }
        }
        self.mark(price);
    }

    /// Revalue at `price` without changing quantity or cost basis.
    pub fn mark(&mut self, price: f64) {
        self.market_value = self.quantity * price;
        self.unrealized_pnl = (price - self.avg_price) * self.quantity;
    }
}
