//! Baseline statistics integration tests

mod common;

use chrono::NaiveDate;
use common::{daily_bars, wavy_closes, ScriptedProvider};
use market_movers::baseline::{BaselineEngine, BaselineError, BaselineOutcome, BaselineState};
use market_movers::config::BaselineConfig;
use market_movers::store::{MemoryStore, StatsStore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
}

fn setup() -> (Arc<MemoryStore>, Arc<ScriptedProvider>, BaselineEngine) {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    provider.set_bars("SPY", daily_bars(&wavy_closes(60, 500)));
    let engine = BaselineEngine::new(store.clone(), provider.clone(), BaselineConfig::default());
    (store, provider, engine)
}

fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

#[tokio::test]
async fn test_moving_average_is_exact() {
    let (store, provider, engine) = setup();

    // 10 older bars that must not count, then 50 with fractional closes
    let mut closes: Vec<Decimal> = (0..10).map(|_| dec!(1000)).collect();
    closes.extend((0..50).map(|i| dec!(20.01) + Decimal::from(i) * dec!(0.37)));
    let expected = closes[10..].iter().copied().sum::<Decimal>() / dec!(50);
    provider.set_bars("AAPL", daily_bars(&closes));

    engine.run(today(), &tickers(&["AAPL"])).await.unwrap();

    let stat = store.ticker_stat("AAPL").await.unwrap().unwrap();
    assert_eq!(stat.moving_average, expected);
    assert_eq!(stat.swing_average, dec!(2));
}

#[tokio::test]
async fn test_bars_are_sorted_before_use() {
    let (store, provider, engine) = setup();

    let closes = wavy_closes(60, 100);
    let mut bars = daily_bars(&closes);
    bars.reverse();
    provider.set_bars("MSFT", bars);

    engine.run(today(), &tickers(&["MSFT"])).await.unwrap();

    let expected = closes[10..].iter().copied().sum::<Decimal>() / dec!(50);
    let stat = store.ticker_stat("MSFT").await.unwrap().unwrap();
    assert_eq!(stat.moving_average, expected);
}

#[tokio::test]
async fn test_benchmark_failure_then_recovery() {
    let (store, provider, engine) = setup();
    provider.set_bars("AAPL", daily_bars(&wavy_closes(60, 150)));
    provider.fail("SPY");

    let result = engine.run(today(), &tickers(&["AAPL"])).await;
    assert!(matches!(result, Err(BaselineError::Benchmark { .. })));
    assert!(store.ticker_stats().await.unwrap().is_empty());
    assert_eq!(store.completion_marker().await.unwrap(), None);
    assert_eq!(engine.status(today()).await.unwrap(), BaselineState::Pending);
    // Only the benchmark was requested
    assert_eq!(provider.bar_calls(), 1);

    // Next invocation attempts the full run again
    provider.recover("SPY");
    let outcome = engine.run(today(), &tickers(&["AAPL"])).await.unwrap();
    assert!(matches!(outcome, BaselineOutcome::Completed(_)));
    assert_eq!(store.ticker_stats().await.unwrap().len(), 1);
    assert_eq!(store.completion_marker().await.unwrap(), Some(today()));
}

#[tokio::test]
async fn test_short_history_ticker_skipped() {
    let (store, provider, engine) = setup();
    provider.set_bars("AAPL", daily_bars(&wavy_closes(60, 150)));
    provider.set_bars("IPO", daily_bars(&wavy_closes(40, 20)));
    provider.set_bars("MSFT", daily_bars(&wavy_closes(55, 300)));

    let outcome = engine
        .run(today(), &tickers(&["AAPL", "IPO", "MSFT"]))
        .await
        .unwrap();

    match outcome {
        BaselineOutcome::Completed(report) => {
            assert_eq!(report.updated, 2);
            assert_eq!(report.skipped, vec!["IPO".to_string()]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let written: Vec<String> = store
        .ticker_stats()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.ticker)
        .collect();
    assert_eq!(written, vec!["AAPL", "MSFT"]);
    assert!(store.ticker_stat("IPO").await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_ticker_fetch_skipped() {
    let (store, provider, engine) = setup();
    provider.set_bars("AAPL", daily_bars(&wavy_closes(60, 150)));
    provider.fail("DOWN");

    let outcome = engine.run(today(), &tickers(&["AAPL", "DOWN"])).await.unwrap();
    assert!(matches!(outcome, BaselineOutcome::Completed(ref r) if r.skipped == vec!["DOWN".to_string()]));
    assert_eq!(store.ticker_stats().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_second_run_same_day_is_noop() {
    let (store, provider, engine) = setup();
    provider.set_bars("AAPL", daily_bars(&wavy_closes(60, 150)));

    engine.run(today(), &tickers(&["AAPL"])).await.unwrap();
    let first = store.ticker_stat("AAPL").await.unwrap().unwrap();
    let calls = provider.bar_calls();

    // Different data would change the stats if the run were repeated
    provider.set_bars("AAPL", daily_bars(&wavy_closes(60, 900)));
    let outcome = engine.run(today(), &tickers(&["AAPL"])).await.unwrap();

    assert_eq!(outcome, BaselineOutcome::AlreadyCompleted);
    assert_eq!(provider.bar_calls(), calls);
    assert_eq!(store.ticker_stat("AAPL").await.unwrap().unwrap(), first);

    // A new trading date runs again and overwrites
    let tomorrow = today().succ_opt().unwrap();
    engine.run(tomorrow, &tickers(&["AAPL"])).await.unwrap();
    let updated = store.ticker_stat("AAPL").await.unwrap().unwrap();
    assert_eq!(updated.as_of, tomorrow);
    assert_ne!(updated.moving_average, first.moving_average);
}

#[tokio::test]
async fn test_beta_against_itself_and_short_overlap() {
    let (store, provider, engine) = setup();
    provider.set_bars("SPYX", daily_bars(&wavy_closes(60, 500)));

    engine.run(today(), &tickers(&["SPYX"])).await.unwrap();
    let stat = store.ticker_stat("SPYX").await.unwrap().unwrap();
    assert!((stat.beta - 1.0).abs() < 1e-9);

    // Beta needs at least 10 aligned returns
    let config = BaselineConfig {
        window: 5,
        ..BaselineConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let engine = BaselineEngine::new(store.clone(), provider.clone(), config);
    engine.run(today(), &tickers(&["SPYX"])).await.unwrap();
    assert_eq!(store.ticker_stat("SPYX").await.unwrap().unwrap().beta, 0.0);
}

#[tokio::test]
async fn test_empty_watchlist_leaves_pending() {
    let (store, _provider, engine) = setup();

    let outcome = engine.run(today(), &[]).await.unwrap();
    assert!(matches!(outcome, BaselineOutcome::NothingToWrite(_)));
    assert_eq!(store.completion_marker().await.unwrap(), None);
}
