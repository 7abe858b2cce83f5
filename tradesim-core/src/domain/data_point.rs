//! DataPoint — a bar enriched with precomputed indicator values.

use super::bar::Bar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known indicator keys written by `data::preprocess`.
pub mod keys {
    pub const MA5: &str = "MA5";
    pub const MACD: &str = "MACD";
    pub const SIGNAL: &str = "Signal";
    pub const MACD_HISTOGRAM: &str = "MACDHistogram";
    pub const RSI: &str = "RSI";
}

/// Named, sparse set of indicator values at a single point in time.
///
/// A missing key means the indicator was not computed; a NaN value means
/// it was computed but is still inside its lookback window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet(BTreeMap<String, f64>);

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Value for `name` only if present and not NaN.
    pub fn valid(&self, name: &str) -> Option<f64> {
        self.get(name).filter(|v| !v.is_nan())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for IndicatorSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One symbol's market state at one timestamp, as fed to `Strategy::on_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub symbol: String,
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub indicators: IndicatorSet,
}

impl DataPoint {
    pub fn from_bar(bar: &Bar, indicators: IndicatorSet) -> Self {
        Self {
            symbol: bar.symbol.clone(),
            time: bar.time,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            indicators,
        }
    }
}
