//! Export — CSV trade logs and equity curves, JSON performance reports.
//!
//! Writers render into memory first; the `write_*`/`save_*` helpers only
//! add file-system plumbing on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tradesim_core::domain::Trade;

use crate::analyzer::PerformanceReport;
use crate::orchestrator::{EquityPoint, StrategyRun};

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: id, timestamp, strategy, symbol, action, price, quantity, fee,
/// order_id
pub fn trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "id",
        "timestamp",
        "strategy",
        "symbol",
        "action",
        "price",
        "quantity",
        "fee",
        "order_id",
    ])?;

    for t in trades {
        wtr.write_record([
            t.id.to_string(),
            t.timestamp.to_rfc3339(),
            t.strategy.clone(),
            t.symbol.clone(),
            t.action.as_str().to_string(),
            format!("{:.6}", t.price),
            format!("{:.6}", t.quantity),
            format!("{:.2}", t.fee),
            t.order_id.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["time", "value"])?;
    for point in equity_curve {
        wtr.write_record([point.time.to_rfc3339(), format!("{:.2}", point.value)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn report_json(reports: &[PerformanceReport]) -> Result<String> {
    serde_json::to_string_pretty(reports).context("failed to serialize performance reports")
}

pub fn import_reports(json: &str) -> Result<Vec<PerformanceReport>> {
    serde_json::from_str(json).context("failed to deserialize performance reports")
}

// ─── Files ──────────────────────────────────────────────────────────

pub fn write_trades_csv(trades: &[Trade], path: &Path) -> Result<()> {
    let csv = trades_csv(trades)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

/// Save one directory per run under `output_dir`:
/// `<name>/trades.csv`, `<name>/equity.csv`, plus `report.json` for all runs.
///
/// Returns the per-run directories in input order. Names that sanitize to
/// the same directory are an error.
pub fn save_runs(runs: &[StrategyRun], output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    // Resolve every directory before writing anything, so a collision
    // leaves the output dir untouched.
    let mut owners: HashMap<String, &str> = HashMap::with_capacity(runs.len());
    for run in runs {
        let dirname = sanitize(&run.name);
        if dirname.is_empty() {
            bail!("strategy name '{}' has no usable characters", run.name);
        }
        if let Some(other) = owners.insert(dirname.clone(), &run.name) {
            bail!(
                "strategies '{}' and '{}' would both export to '{}'",
                other,
                run.name,
                dirname
            );
        }
    }

    let mut dirs = Vec::with_capacity(runs.len());
    for run in runs {
        let dirname = sanitize(&run.name);
        let run_dir = output_dir.join(dirname);
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("failed to create run dir: {}", run_dir.display()))?;

        write_trades_csv(&run.trades, &run_dir.join("trades.csv"))?;
        let equity = equity_csv(&run.equity_curve)?;
        let equity_path = run_dir.join("equity.csv");
        std::fs::write(&equity_path, equity)
            .with_context(|| format!("failed to write {}", equity_path.display()))?;
        dirs.push(run_dir);
    }

    let reports: Vec<PerformanceReport> = runs.iter().map(PerformanceReport::from_run).collect();
    let report_path = output_dir.join("report.json");
    std::fs::write(&report_path, report_json(&reports)?)
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    Ok(dirs)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}
