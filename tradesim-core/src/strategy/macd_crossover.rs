//! MACD crossover — buy when the MACD line crosses above its signal line,
//! sell when it crosses below.

use super::{check_quantity, skip_rejection, Strategy};
use crate::domain::{Action, Bar, DataPoint, Signal};
use crate::error::StrategyError;
use crate::indicators::{closes, Macd, MacdSeries};
use crate::portfolio::Portfolio;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct MacdCrossover {
    name: String,
    macd: Macd,
    quantity: f64,
    closes: HashMap<String, Vec<f64>>,
}

impl Default for MacdCrossover {
    fn default() -> Self {
        Self {
            name: "MACD Strategy".to_string(),
            macd: Macd::new(12, 26, 9),
            quantity: 1.0,
            closes: HashMap::new(),
        }
    }
}

impl MacdCrossover {
    pub fn new(fast: usize, slow: usize, signal: usize, quantity: f64) -> Result<Self, StrategyError> {
        if fast == 0 || signal == 0 || fast >= slow {
            return Err(StrategyError::InvalidParameter(format!(
                "MACD periods must satisfy 1 <= fast < slow and signal >= 1, got {fast}/{slow}/{signal}"
            )));
        }
        check_quantity(quantity)?;
        Ok(Self {
            macd: Macd::new(fast, slow, signal),
            quantity,
            ..Self::default()
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bars needed before the first crossover can fire.
    pub fn min_bars(&self) -> usize {
        self.macd.min_bars()
    }
}

/// Crossover between `i - 1` and `i`, if both points are valid.
fn crossover(series: &MacdSeries, i: usize) -> Option<Action> {
    let (prev_macd, prev_signal) = series.at(i.checked_sub(1)?)?;
    let (macd, signal) = series.at(i)?;
    if prev_macd < prev_signal && macd > signal {
        Some(Action::Buy)
    } else if prev_macd > prev_signal && macd < signal {
        Some(Action::Sell)
    } else {
        None
    }
}

impl Strategy for MacdCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_start(&mut self, _portfolio: &mut Portfolio) -> Result<(), StrategyError> {
        self.closes.clear();
        Ok(())
    }

    fn on_data(
        &mut self,
        points: &[DataPoint],
        portfolio: &mut Portfolio,
    ) -> Result<(), StrategyError> {
        for point in points {
            let buffer = self.closes.entry(point.symbol.clone()).or_default();
            buffer.push(point.close);
            if buffer.len() < self.macd.min_bars() {
                continue;
            }

            let series = self.macd.compute_all(buffer);
            let result = match crossover(&series, buffer.len() - 1) {
                Some(Action::Buy) => portfolio.buy(&point.symbol, point.time, point.close, self.quantity),
                Some(Action::Sell) => portfolio.sell(&point.symbol, point.time, point.close, self.quantity),
                None => continue,
            };
            skip_rejection(&self.name, result)?;
        }
        Ok(())
    }

    fn calculate(&self, bars: &[Bar]) -> BTreeMap<String, Vec<f64>> {
        let series = self.macd.compute_all(&closes(bars));
        BTreeMap::from([
            ("MACD".to_string(), series.macd),
            ("Signal".to_string(), series.signal),
            ("Histogram".to_string(), series.histogram),
        ])
    }

    fn run(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let mut signals = vec![None; bars.len()];
        if bars.len() < self.macd.min_bars() {
            return signals;
        }
        let series = self.macd.compute_all(&closes(bars));
        for i in (self.macd.min_bars() - 1)..bars.len() {
            if let Some(action) = crossover(&series, i) {
                signals[i] = Some(Signal {
                    action,
                    price: bars[i].close,
                    time: bars[i].time,
                    quantity: self.quantity,
                });
            }
        }
        signals
    }
}
