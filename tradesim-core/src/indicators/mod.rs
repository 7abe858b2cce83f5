//! Causal indicators over close-price series.
//!
//! Every indicator maps a series to an output series of the same length.
//! Values inside the lookback window are `f64::NAN`. No output at index `t`
//! depends on input after `t`.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;

/// A single-output indicator.
pub trait Indicator: Send + Sync {
    /// Short name used as the key in indicator maps (e.g. "sma_5").
    fn name(&self) -> &str;

    /// Number of leading NaN outputs.
    fn lookback(&self) -> usize;

    /// Compute over an arbitrary value series.
    fn compute_series(&self, values: &[f64]) -> Vec<f64>;

    /// Compute over the close prices of `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        self.compute_series(&closes(bars))
    }
}

/// Close prices of `bars`, in order.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Synthetic daily bars from close prices.
///
/// open = previous close, high/low = ±1 around the body, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let start = Utc.with_ymd_and_hms(2021, 1, 4, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                symbol: "TEST".to_string(),
                time: start + Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, epsilon={epsilon}"
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    /// Truncating the input must not change any earlier output.
    #[test]
    fn indicators_are_causal() {
        let series: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(5)),
            Box::new(Ema::new(12)),
            Box::new(Rsi::new(14)),
            Box::new(Macd::new(12, 26, 9)),
        ];
        for ind in &indicators {
            let full = ind.compute_series(&series);
            for cut in [10, 30, 45] {
                let partial = ind.compute_series(&series[..cut]);
                for (i, (a, b)) in partial.iter().zip(&full).enumerate() {
                    assert!(
                        (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-9,
                        "{} differs at {i} when truncated to {cut}",
                        ind.name()
                    );
                }
            }
        }
    }

    #[test]
    fn lookback_matches_leading_nans() {
        let series: Vec<f64> = (0..50).map(|i| 10.0 + (i % 7) as f64).collect();
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(5)),
            Box::new(Ema::new(3)),
            Box::new(Rsi::new(9)),
            Box::new(Macd::new(3, 6, 4)),
        ];
        for ind in &indicators {
            let out = ind.compute_series(&series);
            let lead = out.iter().take_while(|v| v.is_nan()).count();
            assert_eq!(lead, ind.lookback(), "{}", ind.name());
        }
    }

    #[test]
    fn compute_uses_closes() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert_eq!(closes(&bars), vec![1.0, 2.0, 3.0]);
        let out = Sma::new(2).compute(&bars);
        assert!(out[0].is_nan());
        assert_approx(out[2], 2.5, DEFAULT_EPSILON);
    }
}
