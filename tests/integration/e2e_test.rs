//! End-to-end integration tests

mod common;

use chrono::Duration;
use common::{open_bell, snapshot, ScriptedProvider};
use market_movers::config::Config;
use market_movers::context::AppContext;
use market_movers::session::{Session, SessionClock};
use market_movers::store::{MemoryStore, MoverStore, PriceHistory, SqliteStore, StatsStore};
use market_movers::watchlist::{StaticWatchlist, WatchlistSource};
use rust_decimal_macros::dec;
use std::sync::Arc;

#[test]
fn test_config_example_parses() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    config.validate().unwrap();
    assert_eq!(config.momentum.horizons.len(), 4);
    assert_eq!(config.baseline.benchmark, "SPY");
}

fn context(store: Arc<dyn market_movers::store::Store>, provider: Arc<ScriptedProvider>) -> AppContext {
    AppContext::from_parts(
        Config::default(),
        store,
        provider,
        Arc::new(StaticWatchlist::new(["aapl", "msft", "tsla"])),
        SessionClock::new_york(),
    )
}

#[tokio::test]
async fn test_ingest_then_classify() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    let ctx = context(store.clone(), provider.clone());
    let ingestor = ctx.ingestor();

    // 09:30 New York: first snapshot
    provider.set_snapshots(vec![
        snapshot("AAPL", dec!(100), dec!(100.4)),
        snapshot("MSFT", dec!(400), dec!(400)),
        snapshot("TSLA", dec!(200), dec!(210)),
    ]);
    let summary = ingestor.run_cycle(open_bell()).await.unwrap();
    assert_eq!(summary.samples, 3);

    // 09:31: AAPL up half a percent, MSFT flat, TSLA still far below yesterday
    provider.set_snapshots(vec![
        snapshot("AAPL", dec!(100.5), dec!(100.4)),
        snapshot("MSFT", dec!(400.1), dec!(400)),
        snapshot("TSLA", dec!(200), dec!(210)),
    ]);
    ingestor
        .run_cycle(open_bell() + Duration::minutes(1))
        .await
        .unwrap();

    let latest = store.latest("AAPL").await.unwrap().unwrap();
    assert_eq!(latest.bucket, 571);
    assert_eq!(latest.session, Session::Regular);

    let tickers = ctx.watchlist.load_tickers().await.unwrap();
    let cycle = ctx.classifier().run_cycle(&tickers).await.unwrap();
    assert_eq!(cycle.tickers, 3);

    let movers = store.movers().await.unwrap();
    let keys: Vec<(String, String)> = movers
        .iter()
        .map(|m| (m.category.to_string(), m.ticker.clone()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("1m_ripper".to_string(), "AAPL".to_string()),
            ("day_dipper".to_string(), "TSLA".to_string()),
        ]
    );
    assert_eq!(movers[0].change_pct, dec!(0.5));
}

#[tokio::test]
async fn test_retention_purges_old_samples() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    let ctx = context(store.clone(), provider.clone());
    let ingestor = ctx.ingestor();

    provider.set_snapshots(vec![snapshot("AAPL", dec!(100), dec!(100))]);
    ingestor.run_cycle(open_bell()).await.unwrap();
    ingestor
        .run_cycle(open_bell() + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(store.sample_count().await, 2);

    // Default retention is three hours
    let summary = ingestor
        .run_cycle(open_bell() + Duration::hours(3) + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(summary.purged, 1);
    assert_eq!(store.sample_count().await, 2);
}

#[tokio::test]
async fn test_full_pipeline_on_sqlite() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = Config::default();
    config.store.database_url = format!("sqlite://{}", dir.path().join("e2e.db").display());

    let store = Arc::new(
        SqliteStore::connect(&config.store, (&config.retry).into())
            .await
            .unwrap(),
    );
    let provider = Arc::new(ScriptedProvider::new());
    provider.set_bars("SPY", common::daily_bars(&common::wavy_closes(60, 500)));
    for ticker in ["AAPL", "MSFT", "TSLA"] {
        provider.set_bars(ticker, common::daily_bars(&common::wavy_closes(60, 100)));
    }
    provider.set_snapshots(vec![snapshot("TSLA", dec!(180), dec!(200))]);

    let ctx = context(store.clone(), provider.clone());
    ctx.ingestor().run_cycle(open_bell()).await.unwrap();

    let tickers = ctx.watchlist.load_tickers().await.unwrap();
    ctx.classifier().run_cycle(&tickers).await.unwrap();
    let movers = store.movers().await.unwrap();
    assert_eq!(movers.len(), 1);
    assert_eq!(movers[0].category.to_string(), "day_dipper");

    let today = common::trading_date();
    ctx.baseline_engine().run(today, &tickers).await.unwrap();
    assert_eq!(store.ticker_stats().await.unwrap().len(), 3);
    assert_eq!(store.completion_marker().await.unwrap(), Some(today));

    ctx.shutdown().await;
    store.close().await;
}
