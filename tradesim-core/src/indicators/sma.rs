//! Simple moving average. First valid value at index `period - 1`.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute_series(&self, values: &[f64]) -> Vec<f64> {
        let p = self.period;
        let mut out = vec![f64::NAN; values.len()];
        // A window containing NaN is NaN; summing the window directly
        // keeps that without tracking a running total.
        for (i, window) in values.windows(p).enumerate() {
            out[i + p - 1] = window.iter().sum::<f64>() / p as f64;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let out = Sma::new(5).compute_series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        assert!(out[..4].iter().all(|v| v.is_nan()));
        assert_approx(out[4], 12.0, DEFAULT_EPSILON);
        assert_approx(out[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_identity() {
        let out = Sma::new(1).compute_series(&[3.0, 4.0]);
        assert_eq!(out, vec![3.0, 4.0]);
    }

    #[test]
    fn sma_nan_window() {
        let out = Sma::new(3).compute_series(&[10.0, f64::NAN, 12.0, 13.0, 14.0]);
        assert!(out[2].is_nan());
        assert!(out[3].is_nan());
        assert_approx(out[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_too_few_values() {
        assert!(Sma::new(5)
            .compute_series(&[1.0, 2.0])
            .iter()
            .all(|v| v.is_nan()));
    }
}
