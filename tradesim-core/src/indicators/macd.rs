//! MACD: fast EMA minus slow EMA, with an EMA signal line and histogram.
//!
//! The MACD line is valid from index `slow - 1`. The signal line is seeded
//! over the first `signal` valid MACD values, so it is valid from
//! `slow + signal - 2`.

use super::ema::ema_of_series;
use super::Indicator;

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

/// The three MACD outputs, each the length of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdSeries {
    /// `(macd, signal)` at `i` when both are valid.
    pub fn at(&self, i: usize) -> Option<(f64, f64)> {
        let m = *self.macd.get(i)?;
        let s = *self.signal.get(i)?;
        (!m.is_nan() && !s.is_nan()).then_some((m, s))
    }
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(
            fast >= 1 && signal >= 1 && fast < slow,
            "MACD requires 1 <= fast < slow and signal >= 1"
        );
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_{fast}_{slow}_{signal}"),
        }
    }

    /// Bars needed before a crossover between two valid points can be observed.
    pub fn min_bars(&self) -> usize {
        self.slow + self.signal
    }

    pub fn compute_all(&self, values: &[f64]) -> MacdSeries {
        let fast = ema_of_series(values, self.fast);
        let slow = ema_of_series(values, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&macd, self.signal);
        let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
        MacdSeries {
            macd,
            signal,
            histogram,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow - 1
    }

    /// The MACD line only; use [`Macd::compute_all`] for signal and histogram.
    fn compute_series(&self, values: &[f64]) -> Vec<f64> {
        let fast = ema_of_series(values, self.fast);
        let slow = ema_of_series(values, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn trending(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn validity_boundaries() {
        let out = Macd::new(3, 6, 4).compute_all(&trending(20));
        assert!(out.macd[4].is_nan());
        assert!(!out.macd[5].is_nan());
        assert!(out.signal[7].is_nan());
        assert!(!out.signal[8].is_nan());
        assert!(out.histogram[7].is_nan());
        assert_eq!(out.at(7), None);
        assert!(out.at(8).is_some());
        assert_eq!(out.at(99), None);
    }

    #[test]
    fn linear_trend_converges_to_constant_spread() {
        // For x[t] = a + t the EMA lags by (period - 1) / 2 once seeded,
        // so fast - slow = (slow - fast) / 2.
        let out = Macd::new(3, 6, 4).compute_all(&trending(40));
        assert_approx(out.macd[39], 1.5, 1e-6);
        assert_approx(out.histogram[39], 0.0, 1e-6);
    }

    #[test]
    fn flat_series_is_zero() {
        let out = Macd::new(12, 26, 9).compute_all(&[10.0; 60]);
        assert_approx(out.macd[59], 0.0, DEFAULT_EPSILON);
        assert_approx(out.signal[59], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn line_matches_compute_all() {
        let series: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64).cos()).collect();
        let macd = Macd::new(5, 10, 3);
        let line = macd.compute_series(&series);
        let all = macd.compute_all(&series);
        for (a, b) in line.iter().zip(&all.macd) {
            assert!((a.is_nan() && b.is_nan()) || (a - b).abs() < DEFAULT_EPSILON);
        }
        assert_eq!(macd.min_bars(), 13);
    }
}
