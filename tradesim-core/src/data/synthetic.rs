//! Deterministic synthetic bars for tests and benches.

use crate::domain::Bar;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Daily bars with a constant price.
pub fn flat_bars(symbol: &str, start: DateTime<Utc>, n: usize, price: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| Bar {
            symbol: symbol.to_string(),
            time: start + Duration::days(i as i64),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1_000.0,
        })
        .collect()
}

/// Seeded geometric random walk of daily bars.
///
/// Each close moves by a uniform return in ±2%; open is the previous close.
/// The same seed always yields the same series.
pub fn random_walk(
    symbol: &str,
    start: DateTime<Utc>,
    n: usize,
    start_price: f64,
    seed: u64,
) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut prev = start_price;
    (0..n)
        .map(|i| {
            let close = prev * (1.0 + rng.gen_range(-0.02..0.02));
            let wick = close * rng.gen_range(0.0..0.01);
            let bar = Bar {
                symbol: symbol.to_string(),
                time: start + Duration::days(i as i64),
                open: prev,
                high: prev.max(close) + wick,
                low: prev.min(close) - wick,
                close,
                volume: rng.gen_range(1_000.0..10_000.0),
            };
            prev = close;
            bar
        })
        .collect()
}
