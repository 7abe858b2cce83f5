//! Exponential moving average, seeded with the SMA of the first `period` values.
//!
//! `EMA[t] = k * x[t] + (1 - k) * EMA[t-1]`, `k = 2 / (period + 1)`.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute_series(&self, values: &[f64]) -> Vec<f64> {
        ema_of_series(values, self.period)
    }
}

/// EMA of a series whose valid region may start after leading NaNs.
///
/// Seeding starts at the first non-NaN value, so the signal line of MACD can
/// be taken directly over the MACD line. A NaN after the seed taints every
/// later value.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 {
        return out;
    }
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return out;
    };
    let seed_end = start + period;
    if seed_end > n {
        return out;
    }

    let seed_window = &values[start..seed_end];
    if seed_window.iter().any(|v| v.is_nan()) {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = seed_window.iter().sum::<f64>() / period as f64;
    out[seed_end - 1] = prev;

    for (i, &x) in values.iter().enumerate().skip(seed_end) {
        if x.is_nan() {
            break;
        }
        prev = k * x + (1.0 - k) * prev;
        out[i] = prev;
    }
    out
}
