//! End-to-end portfolio scenarios through broker, ledger and fee model.

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tradesim_core::domain::{Action, OrderStatus};
use tradesim_core::{FeeModel, Portfolio, RecordingLogger, TradeError, ValuationPolicy};

fn no_slippage() -> FeeModel {
    FeeModel {
        slippage: 0.0,
        ..FeeModel::default()
    }
}

#[test]
fn buy_then_sell_settles_fees_and_flattens() {
    let t0 = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2021, 3, 2, 0, 0, 0).unwrap();
    let fees = no_slippage();
    let mut portfolio = Portfolio::new("scenario", 100_000.0, fees);

    let buy = portfolio.buy("600036.SH", t0, 50.0, 100.0).unwrap().unwrap();
    let sell = portfolio.sell("600036.SH", t1, 60.0, 100.0).unwrap().unwrap();

    let fee_buy = fees.fee(Action::Buy, 50.0, 100.0);
    let fee_sell = fees.fee(Action::Sell, 60.0, 100.0);
    assert!((fee_buy - 11.5).abs() < 1e-9);
    assert!((fee_sell - 6.8).abs() < 1e-9);
    assert_eq!(buy.fee, fee_buy);
    assert_eq!(sell.fee, fee_sell);

    let expected = 100_000.0 - (5_000.0 + fee_buy) + (6_000.0 - fee_sell);
    assert!((portfolio.available_cash() - expected).abs() < 1e-9);
    assert_eq!(portfolio.position_size("600036.SH"), 0.0);
    assert!((portfolio.value() - expected).abs() < 1e-9);

    let trades = portfolio.transactions();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].action, Action::Buy);
    assert_eq!(trades[0].timestamp, t0);
    assert_eq!(trades[1].action, Action::Sell);
    assert_eq!(trades[1].timestamp, t1);

    // both orders are Filled in the ledger
    let ledger = portfolio.broker().ledger();
    for trade in trades {
        assert_eq!(ledger.status(&trade.order_id), Ok(OrderStatus::Filled));
    }
    let pos = &portfolio.positions()["600036.SH"];
    assert!((pos.realized_pnl - 1_000.0).abs() < 1e-9);
}

#[test]
fn slippage_moves_execution_price_against_trader() {
    let t = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
    let mut portfolio = Portfolio::new("slip", 100_000.0, FeeModel::default());
    let buy = portfolio.buy("CMB", t, 50.0, 100.0).unwrap().unwrap();
    let sell = portfolio.sell("CMB", t, 50.0, 100.0).unwrap().unwrap();
    assert!(buy.price > 50.0);
    assert!(sell.price < 50.0);
    assert!(portfolio.available_cash() < 100_000.0);
}

#[test]
fn multi_symbol_valuation_and_logging() {
    let logger = Arc::new(RecordingLogger::new());
    let t = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
    let mut portfolio = Portfolio::new("multi", 10_000.0, FeeModel::frictionless())
        .with_valuation(ValuationPolicy::MarkToMarket)
        .with_logger(logger.clone());

    portfolio.buy("AAA", t, 10.0, 100.0).unwrap();
    portfolio.buy("BBB", t, 20.0, 100.0).unwrap();
    assert_eq!(portfolio.available_cash(), 7_000.0);
    portfolio.mark_price("AAA", t, 11.0);
    portfolio.mark_price("BBB", t, 19.0);
    assert!((portfolio.value() - 10_000.0).abs() < 1e-9);
    portfolio.mark_price("AAA", t, 15.0);
    assert!((portfolio.value() - 10_400.0).abs() < 1e-9);

    let closed = portfolio.close_all_positions(t).unwrap();
    assert_eq!(closed.len(), 2);
    assert!(portfolio.positions().values().all(|p| p.is_flat()));
    assert!((portfolio.available_cash() - 10_400.0).abs() < 1e-9);
    assert_eq!(logger.trades().len(), 4);
}

#[test]
fn selling_unknown_symbol_fails_fast() {
    let t = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
    let mut portfolio = Portfolio::new("empty", 10_000.0, FeeModel::default());
    let err = portfolio.sell("NONE", t, 10.0, 1.0).unwrap_err();
    assert_eq!(
        err,
        TradeError::InsufficientPosition {
            symbol: "NONE".into(),
            requested: 1.0,
            held: 0.0
        }
    );
    assert!(portfolio.broker().ledger().is_empty());
}
