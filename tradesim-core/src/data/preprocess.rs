//! Turn bars into `DataPoint`s carrying precomputed indicators.

use crate::domain::{keys, Bar, DataPoint, IndicatorSet};
use crate::indicators::{Indicator, Macd, Rsi, Sma};
use std::collections::{BTreeMap, HashMap};

const MA_PERIOD: usize = 5;
const MACD_PERIODS: (usize, usize, usize) = (12, 26, 9);
const RSI_PERIOD: usize = 14;

/// Standard indicator columns over a close series: MA5, MACD, Signal,
/// MACDHistogram and RSI. Every column has the length of `closes`.
pub fn indicator_columns(closes: &[f64]) -> BTreeMap<String, Vec<f64>> {
    let (fast, slow, signal) = MACD_PERIODS;
    let macd = Macd::new(fast, slow, signal).compute_all(closes);

    let mut columns = BTreeMap::new();
    columns.insert(keys::MA5.to_string(), Sma::new(MA_PERIOD).compute_series(closes));
    columns.insert(keys::MACD.to_string(), macd.macd);
    columns.insert(keys::SIGNAL.to_string(), macd.signal);
    columns.insert(keys::MACD_HISTOGRAM.to_string(), macd.histogram);
    columns.insert(keys::RSI.to_string(), Rsi::new(RSI_PERIOD).compute_series(closes));
    columns
}

/// Build one `DataPoint` per bar, in input order.
///
/// Bars may interleave several symbols; indicators are computed per symbol
/// over that symbol's bars in the order given, which must be chronological.
/// Values still inside their lookback window are NaN.
pub fn preprocess(bars: &[Bar]) -> Vec<DataPoint> {
    let mut by_symbol: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, bar) in bars.iter().enumerate() {
        by_symbol.entry(bar.symbol.as_str()).or_default().push(i);
    }

    let mut sets = vec![IndicatorSet::new(); bars.len()];
    for indices in by_symbol.values() {
        let series: Vec<f64> = indices.iter().map(|&i| bars[i].close).collect();
        let columns = indicator_columns(&series);
        for (row, &bar_index) in indices.iter().enumerate() {
            sets[bar_index] = columns
                .iter()
                .map(|(name, values)| (name.clone(), values[row]))
                .collect();
        }
    }

    bars.iter()
        .zip(sets)
        .map(|(bar, set)| DataPoint::from_bar(bar, set))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn every_point_carries_all_keys() {
        let bars = make_bars(&(0..40).map(|i| 10.0 + i as f64).collect::<Vec<_>>());
        let points = preprocess(&bars);
        assert_eq!(points.len(), 40);
        for key in [keys::MA5, keys::MACD, keys::SIGNAL, keys::MACD_HISTOGRAM, keys::RSI] {
            assert!(points[0].indicators.get(key).is_some(), "missing {key}");
        }
        assert_eq!(points[3].indicators.valid(keys::MA5), None);
        assert_approx(points[4].indicators.valid(keys::MA5).unwrap(), 12.0, 1e-10);
        assert_eq!(points[32].indicators.valid(keys::SIGNAL), None);
        assert!(points[33].indicators.valid(keys::SIGNAL).is_some());
    }

    #[test]
    fn symbols_are_computed_independently() {
        let mut a = make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut b = make_bars(&[100.0, 100.0, 100.0, 100.0, 100.0]);
        for bar in &mut b {
            bar.symbol = "OTHER".into();
        }
        // interleave a0 b0 a1 b1 ...
        let mut bars = Vec::new();
        for (x, y) in a.drain(..).zip(b.drain(..)) {
            bars.push(x);
            bars.push(y);
        }
        let points = preprocess(&bars);
        assert_eq!(points[8].symbol, "TEST");
        assert_approx(points[8].indicators.valid(keys::MA5).unwrap(), 3.0, 1e-10);
        assert_approx(points[9].indicators.valid(keys::MA5).unwrap(), 100.0, 1e-10);
    }
}
