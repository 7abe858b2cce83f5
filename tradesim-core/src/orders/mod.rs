//! Order lifecycle: the ledger that owns every order and its status.

pub mod ledger;

pub use ledger::{Execution, OrderLedger};
