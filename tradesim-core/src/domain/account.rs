use serde::{Deserialize, Serialize};

/// Broker-side account summary.
///
/// `equity = cash + Σ position market value`; `balance = cash + Σ position cost basis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub cash: f64,
    pub equity: f64,
    pub balance: f64,
}

impl Account {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            equity: initial_cash,
            balance: initial_cash,
        }
    }
}
