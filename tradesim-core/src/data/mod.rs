//! Market-data helpers: indicator preprocessing and synthetic bar series.
//!
//! Loading bars from files is the caller's concern; everything here works
//! on bars already in memory.

pub mod preprocess;
pub mod synthetic;

pub use preprocess::{indicator_columns, preprocess};
pub use synthetic::{flat_bars, random_walk};
