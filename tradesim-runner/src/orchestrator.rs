//! Backtest orchestrator — one isolated portfolio per strategy.
//!
//! Every strategy gets its own `Portfolio` (and therefore its own broker,
//! order ledger and account) and walks the full data stream in ascending
//! timestamp order. Walks share nothing mutable, so they fan out on rayon
//! without locking. A failing strategy ends its own walk only; siblings
//! keep running and its partial trade log is kept in the result.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span, warn};

use tradesim_core::domain::{DataPoint, Position, Trade};
use tradesim_core::{
    FeeModel, FundsPolicy, Portfolio, Strategy, StrategyError, TradeLogger, ValuationPolicy,
};

use crate::config::{in_window, ConfigError, RunConfig};

/// Lifecycle hook a strategy failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Data,
    End,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Start => "on_start",
            Phase::Data => "on_data",
            Phase::End => "on_end",
        };
        f.write_str(s)
    }
}

/// Errors from the orchestrator.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("strategy '{strategy}' failed in {phase}: {source}")]
    Strategy {
        strategy: String,
        phase: Phase,
        #[source]
        source: StrategyError,
    },
}

impl RunError {
    fn strategy(strategy: &str, phase: Phase, source: StrategyError) -> Self {
        RunError::Strategy {
            strategy: strategy.to_string(),
            phase,
            source,
        }
    }
}

/// Portfolio value after one timestamp group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Outcome of one strategy's walk over the data.
#[derive(Debug)]
pub struct StrategyRun {
    pub name: String,
    /// `Err` when a strategy hook failed; the fields below then hold the
    /// state reached before the failure.
    pub outcome: Result<(), RunError>,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub initial_cash: f64,
    pub final_value: f64,
    pub cash: f64,
    pub positions: BTreeMap<String, Position>,
}

impl StrategyRun {
    fn capture(
        name: String,
        outcome: Result<(), RunError>,
        equity_curve: Vec<EquityPoint>,
        portfolio: &Portfolio,
    ) -> Self {
        Self {
            name,
            outcome,
            equity_curve,
            trades: portfolio.transactions().to_vec(),
            initial_cash: portfolio.initial_cash(),
            final_value: portfolio.value(),
            cash: portfolio.available_cash(),
            positions: portfolio
                .positions()
                .iter()
                .map(|(symbol, pos)| (symbol.clone(), pos.clone()))
                .collect(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&RunError> {
        self.outcome.as_ref().err()
    }

    /// Equity values without timestamps, in time order.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.value).collect()
    }
}

/// Runs N strategies over one in-memory data set.
#[derive(Clone)]
pub struct BacktestOrchestrator {
    initial_cash: f64,
    fees: FeeModel,
    funds_policy: FundsPolicy,
    valuation: ValuationPolicy,
    parallel: bool,
    window: Option<(NaiveDate, NaiveDate)>,
    logger: Option<Arc<dyn TradeLogger>>,
}

impl fmt::Debug for BacktestOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BacktestOrchestrator")
            .field("initial_cash", &self.initial_cash)
            .field("fees", &self.fees)
            .field("funds_policy", &self.funds_policy)
            .field("valuation", &self.valuation)
            .field("parallel", &self.parallel)
            .field("window", &self.window)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl BacktestOrchestrator {
    pub fn new(initial_cash: f64, fees: FeeModel) -> Self {
        Self {
            initial_cash,
            fees,
            funds_policy: FundsPolicy::default(),
            valuation: ValuationPolicy::default(),
            parallel: true,
            window: None,
            logger: None,
        }
    }

    /// Validated orchestrator restricted to the config's `[start, end)` window.
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            initial_cash: config.initial_cash,
            fees: config.fees,
            funds_policy: config.funds_policy,
            valuation: config.valuation,
            parallel: config.parallel,
            window: Some((config.start, config.end)),
            logger: None,
        })
    }

    /// Enables or disables parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Logger shared by every strategy's portfolio.
    pub fn with_logger(mut self, logger: Arc<dyn TradeLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_funds_policy(mut self, policy: FundsPolicy) -> Self {
        self.funds_policy = policy;
        self
    }

    pub fn with_valuation(mut self, policy: ValuationPolicy) -> Self {
        self.valuation = policy;
        self
    }

    /// Keep only data points whose date falls in `[start, end)`.
    pub fn with_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.window = Some((start, end));
        self
    }

    /// Run every strategy and wait for all of them.
    ///
    /// Results come back in the order the strategies were given. The outer
    /// `Err` is reserved for problems that prevent any run from starting;
    /// per-strategy failures land in [`StrategyRun::outcome`].
    pub fn run(
        &self,
        strategies: Vec<Box<dyn Strategy>>,
        data: &[DataPoint],
    ) -> Result<Vec<StrategyRun>, RunError> {
        self.check(&strategies)?;

        let points = self.ordered(data);
        let groups = timestamp_groups(&points);
        let symbols: Vec<String> = points
            .iter()
            .map(|p| p.symbol.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        info!(
            strategies = strategies.len(),
            points = points.len(),
            timestamps = groups.len(),
            parallel = self.parallel,
            "backtest started"
        );

        let runs: Vec<StrategyRun> = if self.parallel {
            strategies
                .into_par_iter()
                .map(|strategy| self.run_one(strategy, &points, &groups, &symbols))
                .collect()
        } else {
            strategies
                .into_iter()
                .map(|strategy| self.run_one(strategy, &points, &groups, &symbols))
                .collect()
        };

        let failed = runs.iter().filter(|r| !r.is_ok()).count();
        info!(runs = runs.len(), failed, "backtest finished");
        Ok(runs)
    }

    fn check(&self, strategies: &[Box<dyn Strategy>]) -> Result<(), ConfigError> {
        if !(self.initial_cash > 0.0) || !self.initial_cash.is_finite() {
            return Err(ConfigError::InvalidInitialCash(self.initial_cash));
        }
        if strategies.is_empty() {
            return Err(ConfigError::NoStrategy);
        }
        if !self.fees.is_valid() {
            return Err(ConfigError::InvalidFeeModel);
        }
        if let Some((start, end)) = self.window {
            if start >= end {
                return Err(ConfigError::InvalidDateRange { start, end });
            }
        }
        let mut seen = HashSet::new();
        for strategy in strategies {
            if !seen.insert(strategy.name()) {
                return Err(ConfigError::DuplicateStrategy(strategy.name().to_string()));
            }
        }
        Ok(())
    }

    /// Windowed copy of `data`, stable-sorted by (time, symbol).
    fn ordered(&self, data: &[DataPoint]) -> Vec<DataPoint> {
        let mut points: Vec<DataPoint> = data
            .iter()
            .filter(|p| match self.window {
                Some((start, end)) => in_window(start, end, p.time),
                None => true,
            })
            .cloned()
            .collect();
        points.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.symbol.cmp(&b.symbol)));
        points
    }

    fn portfolio(&self, name: &str) -> Portfolio {
        let portfolio = Portfolio::new(name, self.initial_cash, self.fees)
            .with_funds_policy(self.funds_policy)
            .with_valuation(self.valuation);
        match &self.logger {
            Some(logger) => portfolio.with_logger(Arc::clone(logger)),
            None => portfolio,
        }
    }

    fn run_one(
        &self,
        mut strategy: Box<dyn Strategy>,
        points: &[DataPoint],
        groups: &[Range<usize>],
        symbols: &[String],
    ) -> StrategyRun {
        let name = strategy.name().to_string();
        let span = info_span!("strategy", name = %name);
        let _enter = span.enter();

        let mut portfolio = self.portfolio(&name);
        let mut equity_curve = Vec::with_capacity(groups.len());
        let outcome = walk(
            strategy.as_mut(),
            &mut portfolio,
            points,
            groups,
            symbols,
            &mut equity_curve,
        );

        match &outcome {
            Ok(()) => info!(
                trades = portfolio.transactions().len(),
                value = portfolio.value(),
                "strategy finished"
            ),
            Err(err) => warn!(
                error = %err,
                trades = portfolio.transactions().len(),
                "strategy failed"
            ),
        }

        StrategyRun::capture(name, outcome, equity_curve, &portfolio)
    }
}

/// Validate `config`, build its strategies and run them.
pub fn run_config(
    config: &RunConfig,
    data: &[DataPoint],
    logger: Option<Arc<dyn TradeLogger>>,
) -> Result<Vec<StrategyRun>, RunError> {
    let mut orchestrator = BacktestOrchestrator::from_config(config)?;
    if let Some(logger) = logger {
        orchestrator = orchestrator.with_logger(logger);
    }
    orchestrator.run(config.build_strategies()?, data)
}

// ── Single walk ────────────────────────────────────────────────────────

fn walk(
    strategy: &mut dyn Strategy,
    portfolio: &mut Portfolio,
    points: &[DataPoint],
    groups: &[Range<usize>],
    symbols: &[String],
    equity_curve: &mut Vec<EquityPoint>,
) -> Result<(), RunError> {
    let name = strategy.name().to_string();

    strategy
        .on_start(portfolio)
        .map_err(|e| RunError::strategy(&name, Phase::Start, e))?;

    for range in groups {
        let group = &points[range.clone()];
        let time = group[0].time;
        for point in group {
            portfolio.mark_price(&point.symbol, point.time, point.close);
            portfolio.notify_data(point);
        }
        strategy
            .on_data(group, portfolio)
            .map_err(|e| RunError::strategy(&name, Phase::Data, e))?;
        equity_curve.push(EquityPoint {
            time,
            value: portfolio.value(),
        });
    }

    for symbol in symbols {
        strategy
            .on_end(portfolio, symbol)
            .map_err(|e| RunError::strategy(&name, Phase::End, e))?;
    }
    portfolio.notify_end();
    Ok(())
}

/// Contiguous index ranges of points sharing a timestamp.
fn timestamp_groups(points: &[DataPoint]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=points.len() {
        if i == points.len() || points[i].time != points[start].time {
            if start < i {
                groups.push(start..i);
            }
            start = i;
        }
    }
    groups
}
