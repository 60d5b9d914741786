//! Momentum classifier integration tests

mod common;

use common::{sample, trading_date};
use market_movers::momentum::{Horizon, MomentumClassifier};
use market_movers::session::SessionClock;
use market_movers::store::{MemoryStore, MoverStore, PriceHistory, Store};
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;

fn default_classifier(store: Arc<dyn Store>) -> MomentumClassifier {
    MomentumClassifier::from_config(store, &Default::default(), SessionClock::new_york())
}

#[tokio::test]
async fn test_one_minute_ripper_scenario() {
    let store = Arc::new(MemoryStore::new());
    store.append(sample("X", 0, dec!(100), dec!(100))).await.unwrap();
    store.append(sample("X", 1, dec!(100.5), dec!(100))).await.unwrap();

    let classifier = MomentumClassifier::new(
        store.clone(),
        vec![Horizon::buckets("1m", 1, dec!(0.2), dec!(0.2))],
        SessionClock::new_york(),
    );
    classifier.run_cycle(&["X".to_string()]).await.unwrap();

    let movers = store.movers().await.unwrap();
    assert_eq!(movers.len(), 1);
    assert_eq!(movers[0].category.to_string(), "1m_ripper");
    assert_eq!(movers[0].ticker, "X");
    assert_eq!(movers[0].change_pct, dec!(0.5));
    assert_eq!(movers[0].price, dec!(100.5));
}

#[tokio::test]
async fn test_horizons_are_independent() {
    let store = Arc::new(MemoryStore::new());
    store.append(sample("NVDA", 570, dec!(100), dec!(100))).await.unwrap();
    store.append(sample("NVDA", 599, dec!(101.5), dec!(100))).await.unwrap();
    store.append(sample("NVDA", 600, dec!(101.8), dec!(100))).await.unwrap();

    let classifier = default_classifier(store.clone());
    classifier.run_cycle(&["NVDA".to_string()]).await.unwrap();

    let categories: Vec<String> = store
        .movers()
        .await
        .unwrap()
        .iter()
        .map(|m| m.category.to_string())
        .collect();

    // 1m: +0.30% vs 101.5; 5m and 30m: +1.8% vs 100 (gap-filled); day: +1.8% < 2%
    assert_eq!(categories, vec!["1m_ripper", "30m_ripper", "5m_ripper"]);
}

#[tokio::test]
async fn test_dippers_and_day_horizon() {
    let store = Arc::new(MemoryStore::new());
    store.append(sample("TSLA", 600, dec!(200), dec!(210))).await.unwrap();
    store.append(sample("TSLA", 601, dec!(199), dec!(210))).await.unwrap();
    store.append(sample("AAPL", 600, dec!(150), dec!(150))).await.unwrap();
    store.append(sample("AAPL", 601, dec!(150.1), dec!(150))).await.unwrap();

    let classifier = default_classifier(store.clone());
    let summary = classifier
        .run_cycle(&["TSLA".to_string(), "AAPL".to_string()])
        .await
        .unwrap();
    assert_eq!(summary.tickers, 2);

    let movers = store.movers().await.unwrap();
    let keys: Vec<(String, String)> = movers
        .iter()
        .map(|m| (m.category.to_string(), m.ticker.clone()))
        .collect();

    // TSLA: -0.5% over 1m, -5.2% against the previous close; AAPL is flat
    assert_eq!(
        keys,
        vec![
            ("1m_dipper".to_string(), "TSLA".to_string()),
            ("day_dipper".to_string(), "TSLA".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_no_duplicate_category_ticker_pairs() {
    let store = Arc::new(MemoryStore::new());
    for (ticker, price) in [("A", dec!(110)), ("B", dec!(90)), ("C", dec!(103))] {
        store.append(sample(ticker, 0, dec!(100), dec!(100))).await.unwrap();
        store.append(sample(ticker, 1, price, dec!(100))).await.unwrap();
        // Duplicate bucket write; the later sample wins
        store.append(sample(ticker, 1, price, dec!(100))).await.unwrap();
    }

    let classifier = default_classifier(store.clone());
    let tickers: Vec<String> = ["A", "B", "C", "A", "b"].iter().map(|t| t.to_string()).collect();
    classifier.run_cycle(&tickers).await.unwrap();

    let movers = store.movers().await.unwrap();
    let unique: HashSet<_> = movers.iter().map(|m| m.key()).collect();
    assert_eq!(unique.len(), movers.len());
    assert!(!movers.is_empty());
}

#[tokio::test]
async fn test_lookback_does_not_cross_trading_dates() {
    let store = Arc::new(MemoryStore::new());
    let mut yesterday = sample("X", 600, dec!(50), dec!(100));
    yesterday.trading_date = trading_date().pred_opt().unwrap();
    yesterday.timestamp -= chrono::Duration::days(1);
    store.append(yesterday).await.unwrap();
    store.append(sample("X", 5, dec!(100), dec!(100))).await.unwrap();

    let classifier = MomentumClassifier::new(
        store.clone(),
        vec![Horizon::buckets("1m", 1, dec!(0.2), dec!(0.2))],
        SessionClock::new_york(),
    );
    classifier.run_cycle(&["X".to_string()]).await.unwrap();
    assert!(store.movers().await.unwrap().is_empty());
}
