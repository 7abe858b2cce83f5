//! Performance analyzer — pure functions over an equity curve or trade log.
//!
//! Nothing here holds state. Every statistic is defined on degenerate input
//! (empty curves, no trades, zero variance) and returns 0.0 there instead of
//! dividing by zero.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tradesim_core::domain::{Action, Trade};

use crate::orchestrator::{EquityPoint, StrategyRun};

/// Periods per year used to annualize per-period volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Confidence level of the VaR figure in [`PerformanceReport`].
pub const DEFAULT_VAR_CONFIDENCE: f64 = 0.95;

const EPSILON: f64 = 1e-15;

/// Aggregate statistics for one strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub strategy: String,
    pub initial_cash: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub drawdown_duration: usize,
    pub volatility: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub value_at_risk: f64,
    pub win_rate: f64,
    pub average_profit: f64,
    pub average_loss: f64,
    pub profit_loss_ratio: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    /// Terminal error of a failed run; statistics then cover the partial run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PerformanceReport {
    /// Compute every statistic from an equity curve and trade log.
    pub fn compute(
        strategy: &str,
        initial_cash: f64,
        final_value: f64,
        equity_curve: &[EquityPoint],
        trades: &[Trade],
    ) -> Self {
        let values: Vec<f64> = equity_curve.iter().map(|p| p.value).collect();
        let returns = period_returns(&values);
        let elapsed = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => Duration::zero(),
        };

        let total = total_return(initial_cash, final_value);
        let annualized = annualized_return(total, elapsed);
        let drawdown = max_drawdown(&values);
        let (average_profit, average_loss) = average_profit_loss(trades);

        Self {
            strategy: strategy.to_string(),
            initial_cash,
            final_value,
            total_return: total,
            annualized_return: annualized,
            max_drawdown: drawdown,
            drawdown_duration: drawdown_duration(&values),
            volatility: volatility(&returns),
            annual_volatility: annual_volatility(&returns),
            sharpe_ratio: sharpe_ratio(&returns, 0.0),
            sortino_ratio: sortino_ratio(&returns, 0.0),
            calmar_ratio: calmar_ratio(annualized, drawdown),
            value_at_risk: value_at_risk(&returns, DEFAULT_VAR_CONFIDENCE),
            win_rate: win_rate(trades),
            average_profit,
            average_loss,
            profit_loss_ratio: profit_loss_ratio(average_profit, average_loss),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            error: None,
        }
    }

    pub fn from_run(run: &StrategyRun) -> Self {
        let mut report = Self::compute(
            &run.name,
            run.initial_cash,
            run.final_value,
            &run.equity_curve,
            &run.trades,
        );
        report.error = run.error().map(|e| e.to_string());
        report
    }
}

// ─── Returns ────────────────────────────────────────────────────────

/// `(final − initial) / initial`.
pub fn total_return(initial: f64, final_value: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_value - initial) / initial
}

/// `(1 + total_return)^(1/years) − 1`, with years = elapsed ÷ 365 days.
pub fn annualized_return(total_return: f64, elapsed: Duration) -> f64 {
    let years = elapsed.num_seconds() as f64 / (365.0 * 86_400.0);
    let growth = 1.0 + total_return;
    if years <= 0.0 || growth <= 0.0 {
        return 0.0;
    }
    growth.powf(1.0 / years) - 1.0
}

/// Simple per-period returns of an equity curve.
pub fn period_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

// ─── Drawdown ───────────────────────────────────────────────────────

/// Largest peak-to-trough decline as a positive fraction of the peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in equity_curve {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

/// Longest run of consecutive points strictly below the running peak.
pub fn drawdown_duration(equity_curve: &[f64]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0;
    let mut longest = 0;
    for &value in equity_curve {
        if value < peak {
            current += 1;
            longest = longest.max(current);
        } else {
            peak = value;
            current = 0;
        }
    }
    longest
}

// ─── Risk ───────────────────────────────────────────────────────────

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Per-period volatility.
pub fn volatility(returns: &[f64]) -> f64 {
    std_dev(returns)
}

pub fn annual_volatility(returns: &[f64]) -> f64 {
    volatility(returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// `(mean − rf) / std`, per period, not annualized.
pub fn sharpe_ratio(returns: &[f64], risk_free: f64) -> f64 {
    let std = std_dev(returns);
    if std < EPSILON {
        return 0.0;
    }
    (mean(returns) - risk_free) / std
}

/// Root-mean-square shortfall below `mar`.
///
/// Only returns under `mar` contribute a shortfall, but the mean is taken
/// over every period.
pub fn downside_deviation(returns: &[f64], mar: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = returns
        .iter()
        .filter(|&&r| r < mar)
        .map(|r| (r - mar).powi(2))
        .sum();
    (sum_squares / returns.len() as f64).sqrt()
}

/// `(mean − mar) / downside_deviation`.
pub fn sortino_ratio(returns: &[f64], mar: f64) -> f64 {
    let dd = downside_deviation(returns, mar);
    if dd < EPSILON {
        return 0.0;
    }
    (mean(returns) - mar) / dd
}

/// Annualized return per unit of max drawdown.
pub fn calmar_ratio(annualized_return: f64, max_drawdown: f64) -> f64 {
    if max_drawdown < EPSILON {
        return 0.0;
    }
    annualized_return / max_drawdown
}

/// Historical VaR: the return at index `floor(n × (1 − confidence))` of
/// the ascending sort, clamped to the last index.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let raw = (sorted.len() as f64 * (1.0 - confidence)).floor();
    let index = if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(sorted.len() - 1)
    };
    sorted[index]
}

// ─── Trades ─────────────────────────────────────────────────────────

/// Fraction of all trades that are sells at a positive price.
///
/// A cheap proxy that ignores entry prices; see [`average_profit_loss`]
/// for matched round trips.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades
        .iter()
        .filter(|t| t.action == Action::Sell && t.price > 0.0)
        .count();
    wins as f64 / trades.len() as f64
}

/// Per-share P&L (`sell price − buy price`) of adjacent buy→sell pairs on
/// the same symbol. Quantity is ignored.
///
/// Trades are taken two at a time; a pair that is not a buy followed by a
/// sell of the same symbol is skipped.
fn round_trips(trades: &[Trade]) -> Vec<f64> {
    trades
        .chunks_exact(2)
        .filter(|pair| {
            pair[0].action == Action::Buy
                && pair[1].action == Action::Sell
                && pair[0].symbol == pair[1].symbol
        })
        .map(|pair| pair[1].price - pair[0].price)
        .collect()
}

/// `(average profit, average loss)` over matched round trips; the loss is
/// reported as a positive magnitude.
pub fn average_profit_loss(trades: &[Trade]) -> (f64, f64) {
    let pnls = round_trips(trades);
    let profits: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = pnls.iter().filter(|p| **p < 0.0).map(|p| -p).collect();
    (mean(&profits), mean(&losses))
}

pub fn profit_loss_ratio(average_profit: f64, average_loss: f64) -> f64 {
    if average_loss < EPSILON {
        return 0.0;
    }
    average_profit / average_loss
}

/// Gross round-trip profit over gross loss, capped at 100.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let pnls = round_trips(trades);
    let gross_profit: f64 = pnls.iter().filter(|p| **p > 0.0).sum();
    let gross_loss: f64 = pnls.iter().filter(|p| **p < 0.0).map(|p| p.abs()).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}
