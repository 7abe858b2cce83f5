//! RSI mean reversion — buy when oversold, sell when overbought.

use super::{check_quantity, skip_rejection, Strategy};
use crate::domain::{keys, Action, Bar, DataPoint, Signal};
use crate::error::StrategyError;
use crate::indicators::{closes, Indicator, Rsi};
use crate::portfolio::Portfolio;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct RsiReversion {
    name: String,
    rsi: Rsi,
    oversold: f64,
    overbought: f64,
    quantity: f64,
    closes: HashMap<String, Vec<f64>>,
}

impl Default for RsiReversion {
    fn default() -> Self {
        Self {
            name: "RSI Strategy".to_string(),
            rsi: Rsi::new(14),
            oversold: 30.0,
            overbought: 70.0,
            quantity: 1.0,
            closes: HashMap::new(),
        }
    }
}

impl RsiReversion {
    pub fn new(
        period: usize,
        oversold: f64,
        overbought: f64,
        quantity: f64,
    ) -> Result<Self, StrategyError> {
        if period == 0 {
            return Err(StrategyError::InvalidParameter(
                "RSI period must be >= 1".into(),
            ));
        }
        if !(0.0..=100.0).contains(&oversold)
            || !(0.0..=100.0).contains(&overbought)
            || oversold >= overbought
        {
            return Err(StrategyError::InvalidParameter(format!(
                "RSI thresholds must satisfy 0 <= oversold < overbought <= 100, got {oversold}/{overbought}"
            )));
        }
        check_quantity(quantity)?;
        Ok(Self {
            rsi: Rsi::new(period),
            oversold,
            overbought,
            quantity,
            ..Self::default()
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bars needed for the first RSI value.
    pub fn min_bars(&self) -> usize {
        self.rsi.period() + 1
    }

    fn decide(&self, rsi: f64) -> Option<Action> {
        if rsi.is_nan() {
            None
        } else if rsi < self.oversold {
            Some(Action::Buy)
        } else if rsi > self.overbought {
            Some(Action::Sell)
        } else {
            None
        }
    }
}

impl Strategy for RsiReversion {
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
            if buffer.len() < self.rsi.period() + 1 {
                continue;
            }
            let latest = self.rsi.compute_series(buffer).last().copied().unwrap_or(f64::NAN);

            let result = match self.decide(latest) {
                Some(Action::Buy) => portfolio.buy(&point.symbol, point.time, point.close, self.quantity),
                Some(Action::Sell) => {
                    // Nothing to sell is not an error for a reversion strategy.
                    if portfolio.position_size(&point.symbol) < self.quantity {
                        continue;
                    }
                    portfolio.sell(&point.symbol, point.time, point.close, self.quantity)
                }
                None => continue,
            };
            skip_rejection(&self.name, result)?;
        }
        Ok(())
    }

    fn calculate(&self, bars: &[Bar]) -> BTreeMap<String, Vec<f64>> {
        BTreeMap::from([(keys::RSI.to_string(), self.rsi.compute(bars))])
    }

    fn run(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let values = self.rsi.compute_series(&closes(bars));
        bars.iter()
            .zip(values)
            .map(|(bar, rsi)| {
                self.decide(rsi).map(|action| Signal {
                    action,
                    price: bar.close,
                    time: bar.time,
                    quantity: self.quantity,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::FeeModel;
    use crate::indicators::make_bars;

    #[test]
    fn rejects_bad_thresholds() {
        assert!(RsiReversion::new(14, 70.0, 30.0, 1.0).is_err());
        assert!(RsiReversion::new(0, 30.0, 70.0, 1.0).is_err());
        assert!(RsiReversion::new(14, -1.0, 70.0, 1.0).is_err());
        assert!(RsiReversion::new(9, 35.0, 65.0, 2.0).is_ok());
    }

    #[test]
    fn run_signals_on_extremes() {
        let strategy = RsiReversion::new(3, 30.0, 70.0, 1.0).unwrap();
        // fall then rise
        let bars = make_bars(&[10.0, 9.0, 8.0, 7.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let signals = strategy.run(&bars);
        assert!(signals[..3].iter().all(Option::is_none));
        assert_eq!(signals[3].as_ref().map(|s| s.action), Some(Action::Buy));
        assert_eq!(signals[8].as_ref().map(|s| s.action), Some(Action::Sell));
    }

    #[test]
    fn on_data_trades_through_portfolio() {
        let mut strategy = RsiReversion::new(3, 30.0, 70.0, 1.0).unwrap();
        let mut portfolio = Portfolio::new("rsi", 1_000.0, FeeModel::frictionless());
        strategy.on_start(&mut portfolio).unwrap();
        let bars = make_bars(&[10.0, 9.0, 8.0, 7.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        for bar in &bars {
            let point = DataPoint::from_bar(bar, Default::default());
            strategy.on_data(&[point], &mut portfolio).unwrap();
        }
        let trades = portfolio.transactions();
        assert!(!trades.is_empty());
        assert_eq!(trades[0].action, Action::Buy);
        assert!(trades.iter().any(|t| t.action == Action::Sell));
        assert!(portfolio.position_size("TEST") >= 0.0);
    }
}
