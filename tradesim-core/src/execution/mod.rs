//! Execution friction: fees, slippage and lot rounding.

pub mod fee_model;

pub use fee_model::FeeModel;
