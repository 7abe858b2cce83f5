//! Serializable run configuration.
//!
//! A run is described by a TOML document:
//!
//! ```toml
//! initial_cash = 100000.0
//! start = "2021-01-01"
//! end = "2022-01-01"
//! parallel = true
//! funds_policy = "skip"
//! valuation = "last_trade"
//!
//! [fees]
//! commission = 0.0003
//!
//! [[strategies]]
//! type = "macd"
//! fast = 12
//! slow = 26
//! signal = 9
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tradesim_core::strategy::{MacdCrossover, RsiReversion, Strategy, ThresholdStrategy};
use tradesim_core::{FeeModel, FundsPolicy, StrategyError, ValuationPolicy};

/// Unique identifier for a run (content hash of its configuration).
pub type RunId = String;

/// Construction-time validation failures. Fatal to starting a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid date range: start {start} must be before end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid initial cash {0}: must be > 0")]
    InvalidInitialCash(f64),

    #[error("no strategy configured")]
    NoStrategy,

    #[error("duplicate strategy name '{0}'")]
    DuplicateStrategy(String),

    #[error("invalid fee model: rates must be finite, non-negative and slippage < 1")]
    InvalidFeeModel,

    #[error("strategy #{index}: {source}")]
    Strategy {
        index: usize,
        #[source]
        source: StrategyError,
    },

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything needed to reproduce a run, apart from the market data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub initial_cash: f64,

    /// First day included.
    pub start: NaiveDate,

    /// First day excluded.
    pub end: NaiveDate,

    #[serde(default)]
    pub fees: FeeModel,

    #[serde(default)]
    pub funds_policy: FundsPolicy,

    #[serde(default)]
    pub valuation: ValuationPolicy,

    /// Run strategies on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    #[serde(default)]
    pub strategies: Vec<StrategySpec>,
}

fn default_parallel() -> bool {
    true
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every construction-time invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start >= self.end {
            return Err(ConfigError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        if !(self.initial_cash > 0.0) || !self.initial_cash.is_finite() {
            return Err(ConfigError::InvalidInitialCash(self.initial_cash));
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::NoStrategy);
        }
        if !self.fees.is_valid() {
            return Err(ConfigError::InvalidFeeModel);
        }
        let mut seen = HashSet::new();
        for spec in &self.strategies {
            let name = spec.display_name();
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateStrategy(name));
            }
        }
        Ok(())
    }

    /// Deterministic content hash: identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Instantiate fresh strategies, in configuration order.
    pub fn build_strategies(&self) -> Result<Vec<Box<dyn Strategy>>, ConfigError> {
        self.strategies
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                spec.build()
                    .map_err(|source| ConfigError::Strategy { index, source })
            })
            .collect()
    }

    /// Whether `time` falls inside `[start, end)`.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        in_window(self.start, self.end, time)
    }
}

/// Day-granular `[start, end)` membership shared by configs and the
/// orchestrator's data filter.
pub fn in_window(start: NaiveDate, end: NaiveDate, time: DateTime<Utc>) -> bool {
    let day = time.date_naive();
    start <= day && day < end
}

/// One configured strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    Macd {
        #[serde(default)]
        name: Option<String>,
        #[serde(default = "defaults::fast")]
        fast: usize,
        #[serde(default = "defaults::slow")]
        slow: usize,
        #[serde(default = "defaults::signal")]
        signal: usize,
        #[serde(default = "defaults::unit")]
        quantity: f64,
    },
    Rsi {
        #[serde(default)]
        name: Option<String>,
        #[serde(default = "defaults::rsi_period")]
        period: usize,
        #[serde(default = "defaults::oversold")]
        oversold: f64,
        #[serde(default = "defaults::overbought")]
        overbought: f64,
        #[serde(default = "defaults::unit")]
        quantity: f64,
    },
    Threshold {
        #[serde(default)]
        name: Option<String>,
        #[serde(default = "defaults::lot")]
        quantity: f64,
        #[serde(default = "defaults::stop_loss")]
        stop_loss: f64,
        #[serde(default = "defaults::take_profit")]
        take_profit: f64,
    },
}

mod defaults {
    pub fn fast() -> usize {
        12
    }
    pub fn slow() -> usize {
        26
    }
    pub fn signal() -> usize {
        9
    }
    pub fn rsi_period() -> usize {
        14
    }
    pub fn oversold() -> f64 {
        30.0
    }
    pub fn overbought() -> f64 {
        70.0
    }
    pub fn unit() -> f64 {
        1.0
    }
    pub fn lot() -> f64 {
        100.0
    }
    pub fn stop_loss() -> f64 {
        0.05
    }
    pub fn take_profit() -> f64 {
        0.10
    }
}

impl StrategySpec {
    /// Configured name, or one derived from the parameters.
    pub fn display_name(&self) -> String {
        match self {
            StrategySpec::Macd {
                name,
                fast,
                slow,
                signal,
                ..
            } => name
                .clone()
                .unwrap_or_else(|| format!("macd_{fast}_{slow}_{signal}")),
            StrategySpec::Rsi { name, period, .. } => {
                name.clone().unwrap_or_else(|| format!("rsi_{period}"))
            }
            StrategySpec::Threshold { name, .. } => {
                name.clone().unwrap_or_else(|| "threshold".to_string())
            }
        }
    }

    pub fn build(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        let name = self.display_name();
        let strategy: Box<dyn Strategy> = match *self {
            StrategySpec::Macd {
                fast,
                slow,
                signal,
                quantity,
                ..
            } => Box::new(MacdCrossover::new(fast, slow, signal, quantity)?.with_name(name)),
            StrategySpec::Rsi {
                period,
                oversold,
                overbought,
                quantity,
                ..
            } => Box::new(RsiReversion::new(period, oversold, overbought, quantity)?.with_name(name)),
            StrategySpec::Threshold {
                quantity,
                stop_loss,
                take_profit,
                ..
            } => Box::new(ThresholdStrategy::new(quantity, stop_loss, take_profit)?.with_name(name)),
        };
        Ok(strategy)
    }
}
