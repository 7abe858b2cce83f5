//! MA5/MACD threshold strategy with fixed stop loss and take profit.
//!
//! Entry: close > MA5 × 0.98, MACD > signal and histogram > 0.
//! Exit (first that applies): return < −5%, return > +10%, or MACD below
//! signal with a negative histogram.
//!
//! Reads precomputed indicators from each `DataPoint`; run the data through
//! `data::preprocess` first.

use super::{check_quantity, skip_rejection, Strategy};
use crate::data::{indicator_columns, preprocess};
use crate::domain::{keys, Action, Bar, DataPoint, IndicatorSet, Signal};
use crate::error::StrategyError;
use crate::indicators::closes;
use crate::portfolio::Portfolio;
use std::collections::{BTreeMap, HashMap};

const MA_TOLERANCE: f64 = 0.98;

#[derive(Debug, Clone, Copy)]
struct Inputs {
    ma5: f64,
    macd: f64,
    signal: f64,
    histogram: f64,
}

impl Inputs {
    /// `Err` if a key is absent, `Ok(None)` while any value is still warming up.
    fn read(set: &IndicatorSet) -> Result<Option<Self>, StrategyError> {
        let mut values = [0.0; 4];
        let names = [keys::MA5, keys::MACD, keys::SIGNAL, keys::MACD_HISTOGRAM];
        for (slot, name) in values.iter_mut().zip(names) {
            *slot = set
                .get(name)
                .ok_or_else(|| StrategyError::MissingIndicator(name.to_string()))?;
        }
        if values.iter().any(|v| v.is_nan()) {
            return Ok(None);
        }
        let [ma5, macd, signal, histogram] = values;
        Ok(Some(Self {
            ma5,
            macd,
            signal,
            histogram,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct ThresholdStrategy {
    name: String,
    quantity: f64,
    stop_loss: f64,
    take_profit: f64,
    /// Entry close per symbol while holding.
    entries: HashMap<String, f64>,
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self {
            name: "Threshold Strategy".to_string(),
            quantity: 100.0,
            stop_loss: 0.05,
            take_profit: 0.10,
            entries: HashMap::new(),
        }
    }
}

impl ThresholdStrategy {
    pub fn new(quantity: f64, stop_loss: f64, take_profit: f64) -> Result<Self, StrategyError> {
        check_quantity(quantity)?;
        if !(stop_loss > 0.0 && stop_loss < 1.0) || !(take_profit > 0.0) {
            return Err(StrategyError::InvalidParameter(format!(
                "stop loss must be in (0, 1) and take profit > 0, got {stop_loss}/{take_profit}"
            )));
        }
        Ok(Self {
            quantity,
            stop_loss,
            take_profit,
            ..Self::default()
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn should_enter(&self, close: f64, x: &Inputs) -> bool {
        close > x.ma5 * MA_TOLERANCE && x.macd > x.signal && x.histogram > 0.0
    }

    fn should_exit(&self, close: f64, entry: f64, x: &Inputs) -> bool {
        let ret = (close - entry) / entry;
        ret < -self.stop_loss || ret > self.take_profit || (x.macd < x.signal && x.histogram < 0.0)
    }

    /// Next action for one point given the current entry price.
    fn step(&self, close: f64, entry: Option<f64>, x: &Inputs) -> Option<Action> {
        match entry {
            None if self.should_enter(close, x) => Some(Action::Buy),
            Some(entry) if self.should_exit(close, entry, x) => Some(Action::Sell),
            _ => None,
        }
    }
}

impl Strategy for ThresholdStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_start(&mut self, _portfolio: &mut Portfolio) -> Result<(), StrategyError> {
        self.entries.clear();
        Ok(())
    }

    fn on_data(
        &mut self,
        points: &[DataPoint],
        portfolio: &mut Portfolio,
    ) -> Result<(), StrategyError> {
        for point in points {
            let Some(inputs) = Inputs::read(&point.indicators)? else {
                continue;
            };
            let entry = self.entries.get(&point.symbol).copied();

            match self.step(point.close, entry, &inputs) {
                Some(Action::Buy) => {
                    let result = portfolio.buy(&point.symbol, point.time, point.close, self.quantity);
                    if skip_rejection(&self.name, result)?.is_some() {
                        self.entries.insert(point.symbol.clone(), point.close);
                    }
                }
                Some(Action::Sell) => {
                    let quantity = portfolio.position_size(&point.symbol).min(self.quantity);
                    if quantity > 0.0 {
                        let result = portfolio.sell(&point.symbol, point.time, point.close, quantity);
                        skip_rejection(&self.name, result)?;
                    }
                    self.entries.remove(&point.symbol);
                }
                None => {}
            }
        }
        Ok(())
    }

    fn on_end(&mut self, portfolio: &mut Portfolio, symbol: &str) -> Result<(), StrategyError> {
        self.entries.remove(symbol);
        if let Some(time) = portfolio.last_mark_time() {
            portfolio.close_position(symbol, time)?;
        }
        Ok(())
    }

    fn calculate(&self, bars: &[Bar]) -> BTreeMap<String, Vec<f64>> {
        let mut columns = indicator_columns(&closes(bars));
        columns.remove(keys::RSI);
        columns
    }

    fn run(&self, bars: &[Bar]) -> Vec<Option<Signal>> {
        let mut entry = None;
        preprocess(bars)
            .iter()
            .map(|point| {
                let inputs = Inputs::read(&point.indicators).ok().flatten()?;
                let action = self.step(point.close, entry, &inputs)?;
                entry = match action {
                    Action::Buy => Some(point.close),
                    Action::Sell => None,
                };
                Some(Signal {
                    action,
                    price: point.close,
                    time: point.time,
                    quantity: self.quantity,
                })
            })
            .collect()
    }
}
