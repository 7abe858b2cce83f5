//! Criterion benchmarks for the simulation core hot paths.
//!
//! Benchmarks:
//! 1. Order ledger create/execute cycle
//! 2. Portfolio buy/sell round trips through the broker
//! 3. Indicator preprocessing (MA5, MACD, RSI columns)

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tradesim_core::data::{preprocess, random_walk};
use tradesim_core::domain::{Action, OrderType};
use tradesim_core::{FeeModel, OrderLedger, Portfolio};

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_ledger(c: &mut Criterion) {
    c.bench_function("ledger_create_execute_1k", |b| {
        b.iter(|| {
            let mut ledger = OrderLedger::new();
            for _ in 0..1_000 {
                let id = ledger
                    .create_order("bench", "AAA", Action::Buy, 1.0, 10.0, OrderType::Market)
                    .unwrap();
                ledger.execute_order(&id, |_| Ok(())).unwrap();
            }
            black_box(ledger.len())
        });
    });
}

fn bench_portfolio(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    c.bench_function("portfolio_round_trips_500", |b| {
        b.iter(|| {
            let mut portfolio = Portfolio::new("bench", 1_000_000.0, FeeModel::default());
            for i in 0..500 {
                let t = start + Duration::days(i);
                let price = 100.0 + (i as f64 * 0.1).sin();
                portfolio.mark_price("AAA", t, price);
                portfolio.buy("AAA", t, price, 10.0).unwrap();
                portfolio.sell("AAA", t, price, 10.0).unwrap();
            }
            black_box(portfolio.value())
        });
    });
}

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    for n in [252, 2520] {
        let bars = random_walk("AAA", start, n, 100.0, 3);
        group.bench_with_input(BenchmarkId::from_parameter(n), &bars, |b, bars| {
            b.iter(|| preprocess(black_box(bars)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ledger, bench_portfolio, bench_preprocess);
criterion_main!(benches);
