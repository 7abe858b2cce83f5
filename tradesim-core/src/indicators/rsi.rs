//! Relative Strength Index with Wilder smoothing.
//!
//! `RSI = 100 - 100 / (1 + avg_gain / avg_loss)`; first valid value at
//! index `period`, so `period + 1` bars are needed.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute_series(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let p = self.period;
        let mut out = vec![f64::NAN; n];
        if n <= p {
            return out;
        }

        let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
        let split = |ch: f64| (ch.max(0.0), (-ch).max(0.0));

        let seed = &changes[..p];
        if seed.iter().any(|c| c.is_nan()) {
            return out;
        }
        let (mut gain, mut loss) = seed.iter().fold((0.0, 0.0), |(g, l), &ch| {
            let (up, down) = split(ch);
            (g + up, l + down)
        });
        gain /= p as f64;
        loss /= p as f64;
        out[p] = rsi_from_averages(gain, loss);

        let alpha = 1.0 / p as f64;
        for (i, &ch) in changes.iter().enumerate().skip(p) {
            if ch.is_nan() {
                break;
            }
            let (up, down) = split(ch);
            gain = alpha * up + (1.0 - alpha) * gain;
            loss = alpha * down + (1.0 - alpha) * loss;
            out[i + 1] = rsi_from_averages(gain, loss);
        }
        out
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 50.0,
        (false, true) => 100.0,
        (true, false) => 0.0,
        (false, false) => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn all_gains_is_100() {
        let out = Rsi::new(3).compute_series(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        assert!(out[2].is_nan());
        assert_approx(out[3], 100.0, 1e-9);
        assert_approx(out[4], 100.0, 1e-9);
    }

    #[test]
    fn all_losses_is_0() {
        let out = Rsi::new(3).compute_series(&[105.0, 104.0, 103.0, 102.0]);
        assert_approx(out[3], 0.0, 1e-9);
    }

    #[test]
    fn flat_is_50() {
        let out = Rsi::new(14).compute_series(&[20.0; 30]);
        assert!(out[13].is_nan());
        assert!(out[14..].iter().all(|&v| v == 50.0));
    }

    #[test]
    fn seed_value() {
        // changes +0.34, -0.25, -0.48 → avg gain 0.34/3, avg loss 0.73/3
        let out = Rsi::new(3).compute_series(&[44.0, 44.34, 44.09, 43.61]);
        assert_approx(out[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
    }

    #[test]
    fn bounded() {
        let out = Rsi::new(3).compute_series(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0]);
        assert!(out
            .iter()
            .filter(|v| !v.is_nan())
            .all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn needs_period_plus_one_values() {
        assert!(Rsi::new(3)
            .compute_series(&[1.0, 2.0, 3.0])
            .iter()
            .all(|v| v.is_nan()));
    }
}
