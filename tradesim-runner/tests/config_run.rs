//! End-to-end: TOML config → strategies → orchestrated run → reports → files.

use chrono::{TimeZone, Utc};
use tradesim_core::data::{preprocess, random_walk};
use tradesim_core::FundsPolicy;
use tradesim_runner::export::{import_reports, save_runs};
use tradesim_runner::{run_config, ConfigError, PerformanceReport, RunConfig, RunError};

const CONFIG: &str = r#"
initial_cash = 50000.0
start = "2021-03-01"
end = "2021-09-01"
parallel = true
funds_policy = "reject"
valuation = "mark_to_market"

[fees]
stamp_duty = 0.001
commission = 0.0003
fixed_fee = 5.0
slippage = 0.0005

[[strategies]]
type = "macd"
name = "macd fast"
fast = 8
slow = 21
signal = 5

[[strategies]]
type = "rsi"

[[strategies]]
type = "threshold"
quantity = 50
"#;

fn data() -> Vec<tradesim_core::domain::DataPoint> {
    let start = Utc.with_ymd_and_hms(2021, 1, 4, 0, 0, 0).unwrap();
    preprocess(&random_walk("600036.SH", start, 365, 40.0, 42))
}

#[test]
fn config_drives_a_windowed_run() {
    let config = RunConfig::from_toml_str(CONFIG).unwrap();
    assert_eq!(config.funds_policy, FundsPolicy::Reject);

    let runs = run_config(&config, &data(), None).unwrap();
    let names: Vec<&str> = runs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["macd fast", "rsi_14", "threshold"]);

    for run in &runs {
        assert!(run.is_ok(), "{}: {:?}", run.name, run.error());
        assert_eq!(run.initial_cash, 50_000.0);
        let first = run.equity_curve.first().unwrap().time.date_naive();
        let last = run.equity_curve.last().unwrap().time.date_naive();
        assert!(first >= config.start);
        assert!(last < config.end);
        for trade in &run.trades {
            assert!(config.contains(trade.timestamp));
        }
    }
}

#[test]
fn invalid_config_never_starts() {
    let mut config = RunConfig::from_toml_str(CONFIG).unwrap();
    config.initial_cash = -1.0;
    let err = run_config(&config, &data(), None).unwrap_err();
    assert!(matches!(
        err,
        RunError::Config(ConfigError::InvalidInitialCash(_))
    ));

    let mut config = RunConfig::from_toml_str(CONFIG).unwrap();
    config.strategies.clear();
    assert!(matches!(
        run_config(&config, &data(), None),
        Err(RunError::Config(ConfigError::NoStrategy))
    ));
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    std::fs::write(&path, CONFIG).unwrap();
    let loaded = RunConfig::load(&path).unwrap();
    assert_eq!(loaded, RunConfig::from_toml_str(CONFIG).unwrap());

    let missing = RunConfig::load(&dir.path().join("missing.toml"));
    assert!(matches!(missing, Err(ConfigError::Read { .. })));
}

#[test]
fn runs_are_saved_as_artifacts() {
    let config = RunConfig::from_toml_str(CONFIG).unwrap();
    let runs = run_config(&config, &data(), None).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let dirs = save_runs(&runs, dir.path()).unwrap();
    assert_eq!(dirs.len(), 3);
    assert!(dirs[0].ends_with("macd_fast"));

    for (run, run_dir) in runs.iter().zip(&dirs) {
        let trades = std::fs::read_to_string(run_dir.join("trades.csv")).unwrap();
        assert_eq!(trades.lines().count(), run.trades.len() + 1);
        let equity = std::fs::read_to_string(run_dir.join("equity.csv")).unwrap();
        assert_eq!(equity.lines().count(), run.equity_curve.len() + 1);
    }

    let json = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
    let reports = import_reports(&json).unwrap();
    let expected: Vec<PerformanceReport> = runs.iter().map(PerformanceReport::from_run).collect();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[1].strategy, expected[1].strategy);
    assert_eq!(reports[1].trade_count, expected[1].trade_count);
}
