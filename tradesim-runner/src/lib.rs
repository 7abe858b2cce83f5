//! TradeSim Runner — backtest orchestration, performance analysis, export.
//!
//! This crate builds on `tradesim-core` to provide:
//! - TOML run configuration with validation and content-hashed run ids
//! - The backtest orchestrator (one isolated portfolio per strategy, rayon fan-out)
//! - Performance statistics and per-run reports
//! - CSV/JSON export of trade logs, equity curves and reports
//! - `tracing-subscriber` setup

pub mod analyzer;
pub mod config;
pub mod export;
pub mod logging;
pub mod orchestrator;

pub use analyzer::PerformanceReport;
pub use config::{ConfigError, RunConfig, RunId, StrategySpec};
pub use logging::{init_logging, LogFormat};
pub use orchestrator::{
    run_config, BacktestOrchestrator, EquityPoint, Phase, RunError, StrategyRun,
};
