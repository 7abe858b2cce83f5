//! Domain types for the simulation core.

pub mod account;
pub mod bar;
pub mod data_point;
pub mod fill;
pub mod ids;
pub mod order;
pub mod position;
pub mod signal;
pub mod trade;

pub use account::Account;
pub use bar::Bar;
pub use data_point::{keys, DataPoint, IndicatorSet};
pub use fill::Fill;
pub use ids::{IdGen, OrderId, TradeId};
pub use order::{Action, Order, OrderAuditEntry, OrderStatus, OrderType};
pub use position::Position;
pub use signal::Signal;
pub use trade::Trade;
