//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use market_movers::provider::{DailyBar, MarketDataProvider, ProviderError, Snapshot};
use market_movers::session::Session;
use market_movers::store::PriceSample;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Provider replaying scripted snapshots and bar series
#[derive(Default)]
pub struct ScriptedProvider {
    snapshots: Mutex<Vec<Snapshot>>,
    bars: Mutex<HashMap<String, Vec<DailyBar>>>,
    failing: Mutex<HashSet<String>>,
    bar_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_snapshots(&self, snapshots: Vec<Snapshot>) {
        *self.snapshots.lock().unwrap() = snapshots;
    }

    pub fn set_bars(&self, ticker: &str, bars: Vec<DailyBar>) {
        self.bars.lock().unwrap().insert(ticker.to_string(), bars);
    }

    /// Make `daily_bars` fail for `ticker` until `recover` is called
    pub fn fail(&self, ticker: &str) {
        self.failing.lock().unwrap().insert(ticker.to_string());
    }

    pub fn recover(&self, ticker: &str) {
        self.failing.lock().unwrap().remove(ticker);
    }

    pub fn bar_calls(&self) -> usize {
        self.bar_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn latest_snapshots(&self, tickers: &[String]) -> Result<Vec<Snapshot>, ProviderError> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| tickers.contains(&s.ticker))
            .cloned()
            .collect())
    }

    async fn daily_bars(
        &self,
        ticker: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ProviderError> {
        self.bar_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(ticker) {
            return Err(ProviderError::Transport(format!("{ticker} unavailable")));
        }
        Ok(self.bars.lock().unwrap().get(ticker).cloned().unwrap_or_default())
    }
}

pub fn trading_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
}

/// 13:30 UTC on the trading date, 09:30 in New York
pub fn open_bell() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 12, 13, 30, 0).unwrap()
}

pub fn sample(ticker: &str, bucket: u32, price: Decimal, prev_close: Decimal) -> PriceSample {
    PriceSample {
        ticker: ticker.to_string(),
        trading_date: trading_date(),
        bucket,
        session: Session::Regular,
        price,
        day_open: prev_close,
        prev_close,
        // One sample per minute, aligned with the bucket
        timestamp: Utc.with_ymd_and_hms(2024, 3, 12, 4, 0, 0).unwrap() + Duration::minutes(bucket as i64),
    }
}

pub fn snapshot(ticker: &str, price: Decimal, prev_close: Decimal) -> Snapshot {
    Snapshot {
        ticker: ticker.to_string(),
        price: Some(price),
        day_open: Some(prev_close),
        prev_close: Some(prev_close),
        updated: open_bell(),
    }
}

/// One daily bar per close, oldest first, each with a 2.0 high-low range
pub fn daily_bars(closes: &[Decimal]) -> Vec<DailyBar> {
    let start = Utc.with_ymd_and_hms(2023, 12, 1, 5, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| DailyBar {
            open: *close,
            high: *close + Decimal::ONE,
            low: *close - Decimal::ONE,
            close: *close,
            timestamp: start + Duration::days(i as i64),
        })
        .collect()
}

/// Closes cycling through a small pattern so returns have non-zero variance
pub fn wavy_closes(len: usize, base: i64) -> Vec<Decimal> {
    (0..len)
        .map(|i| Decimal::from(base + ((i as i64 * 7) % 11)))
        .collect()
}
