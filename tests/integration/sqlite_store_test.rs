//! SQLite store integration tests against a temporary database file

mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::{sample, trading_date};
use market_movers::baseline::TickerStat;
use market_movers::config::StoreConfig;
use market_movers::momentum::{Direction, Horizon, Mover};
use market_movers::retry::RetryPolicy;
use market_movers::session::Session;
use market_movers::store::{MoverStore, PriceHistory, SqliteStore, StatsStore};
use rust_decimal_macros::dec;
use tempfile::TempDir;

async fn open(dir: &TempDir) -> SqliteStore {
    let config = StoreConfig {
        database_url: format!("sqlite://{}", dir.path().join("movers.db").display()),
        ..StoreConfig::default()
    };
    SqliteStore::connect(&config, RetryPolicy::default()).await.unwrap()
}

fn mover(label: &str, direction: Direction, ticker: &str) -> Mover {
    Mover {
        category: Horizon::buckets(label, 1, dec!(0.2), dec!(0.2)).category(direction),
        ticker: ticker.to_string(),
        price: dec!(123.4500),
        change_pct: dec!(-0.75),
        session: Session::PostMarket,
        computed_at: Utc.with_ymd_and_hms(2024, 3, 12, 21, 0, 0).unwrap(),
    }
}

fn stat(ticker: &str, moving_average: rust_decimal::Decimal, as_of: NaiveDate) -> TickerStat {
    TickerStat {
        ticker: ticker.to_string(),
        moving_average,
        swing_average: dec!(3.125),
        beta: 1.25,
        as_of,
    }
}

#[tokio::test]
async fn test_sample_round_trip_preserves_precision() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    let original = sample("AAPL", 575, dec!(187.4200), dec!(186.1));
    store.append(original.clone()).await.unwrap();

    let latest = store.latest("AAPL").await.unwrap().unwrap();
    assert_eq!(latest, original);
    assert_eq!(latest.price.to_string(), "187.4200");
}

#[tokio::test]
async fn test_at_or_before_semantics() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    let mut first = sample("AAPL", 570, dec!(100), dec!(100));
    let mut second = sample("AAPL", 570, dec!(101), dec!(100));
    first.timestamp = Utc.with_ymd_and_hms(2024, 3, 12, 13, 30, 5).unwrap();
    second.timestamp = Utc.with_ymd_and_hms(2024, 3, 12, 13, 30, 40).unwrap();
    store
        .append_batch(&[second, first, sample("AAPL", 580, dec!(102), dec!(100))])
        .await
        .unwrap();

    let date = trading_date();
    // Same bucket: latest timestamp wins regardless of insert order
    let hit = store.at_or_before("AAPL", date, 575).await.unwrap().unwrap();
    assert_eq!(hit.price, dec!(101));
    assert_eq!(hit.bucket, 570);

    let hit = store.at_or_before("AAPL", date, 580).await.unwrap().unwrap();
    assert_eq!(hit.price, dec!(102));

    assert!(store.at_or_before("AAPL", date, 569).await.unwrap().is_none());
    assert!(store.at_or_before("MSFT", date, 600).await.unwrap().is_none());
    assert!(store
        .at_or_before("AAPL", date.succ_opt().unwrap(), 600)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_purge_before_cutoff() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    // Buckets map to 04:00 UTC plus that many minutes
    store
        .append_batch(&[
            sample("AAPL", 0, dec!(1), dec!(1)),
            sample("AAPL", 100, dec!(2), dec!(1)),
            sample("MSFT", 200, dec!(3), dec!(1)),
        ])
        .await
        .unwrap();

    let cutoff = Utc.with_ymd_and_hms(2024, 3, 12, 4, 0, 0).unwrap() + Duration::minutes(100);
    assert_eq!(store.purge_before(cutoff).await.unwrap(), 1);
    assert_eq!(store.tickers().await.unwrap(), vec!["AAPL", "MSFT"]);

    assert_eq!(store.purge_before(cutoff + Duration::hours(10)).await.unwrap(), 2);
    assert!(store.tickers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replace_movers_is_wholesale() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    store
        .replace_movers(&[
            mover("5m", Direction::Dipper, "TSLA"),
            mover("1m", Direction::Ripper, "AAPL"),
            mover("1m", Direction::Ripper, "AAPL"),
        ])
        .await
        .unwrap();

    let movers = store.movers().await.unwrap();
    assert_eq!(movers.len(), 2);
    assert_eq!(movers[0].category.to_string(), "1m_ripper");
    assert_eq!(movers[1], mover("5m", Direction::Dipper, "TSLA"));

    store
        .replace_movers(&[mover("day", Direction::Ripper, "NVDA")])
        .await
        .unwrap();
    let movers = store.movers().await.unwrap();
    assert_eq!(movers.len(), 1);
    assert_eq!(movers[0].ticker, "NVDA");

    store.replace_movers(&[]).await.unwrap();
    assert!(store.movers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_commit_daily_upserts_and_marks() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    let day1 = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
    let day2 = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();

    assert_eq!(store.completion_marker().await.unwrap(), None);

    store
        .commit_daily(&[stat("MSFT", dec!(410.5), day1), stat("AAPL", dec!(180.25), day1)], day1)
        .await
        .unwrap();
    assert_eq!(store.completion_marker().await.unwrap(), Some(day1));

    store
        .commit_daily(&[stat("AAPL", dec!(181.75), day2)], day2)
        .await
        .unwrap();
    assert_eq!(store.completion_marker().await.unwrap(), Some(day2));

    let stats = store.ticker_stats().await.unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0], stat("AAPL", dec!(181.75), day2));
    // Not in the second run, so untouched
    assert_eq!(stats[1], stat("MSFT", dec!(410.5), day1));
    assert!(store.ticker_stat("NONE").await.unwrap().is_none());
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();

    {
        let store = open(&dir).await;
        store.append(sample("AAPL", 600, dec!(100), dec!(99))).await.unwrap();
        store.commit_daily(&[stat("AAPL", dec!(99), day)], day).await.unwrap();
        store.close().await;
    }

    let store = open(&dir).await;
    assert_eq!(store.completion_marker().await.unwrap(), Some(day));
    assert_eq!(store.latest("AAPL").await.unwrap().unwrap().price, dec!(100));
}
