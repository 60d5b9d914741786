//! In-process store for tests and dry runs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{MoverStore, PriceHistory, PriceSample, StatsStore, StoreError};
use crate::baseline::TickerStat;
use crate::momentum::Mover;

#[derive(Default)]
struct Inner {
    /// Insertion order breaks timestamp ties, like the SQLite row id
    samples: Vec<PriceSample>,
    movers: Vec<Mover>,
    stats: BTreeMap<String, TickerStat>,
    marker: Option<NaiveDate>,
}

/// Store held entirely in memory; nothing survives the process
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples held
    pub async fn sample_count(&self) -> usize {
        self.inner.read().await.samples.len()
    }
}

#[async_trait]
impl PriceHistory for MemoryStore {
    async fn append(&self, sample: PriceSample) -> Result<(), StoreError> {
        self.inner.write().await.samples.push(sample);
        Ok(())
    }

    async fn append_batch(&self, samples: &[PriceSample]) -> Result<usize, StoreError> {
        self.inner.write().await.samples.extend_from_slice(samples);
        Ok(samples.len())
    }

    async fn latest(&self, ticker: &str) -> Result<Option<PriceSample>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.ticker == ticker)
            .max_by_key(|(seq, s)| (s.timestamp, *seq))
            .map(|(_, s)| s.clone()))
    }

    async fn at_or_before(
        &self,
        ticker: &str,
        trading_date: NaiveDate,
        bucket: u32,
    ) -> Result<Option<PriceSample>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.ticker == ticker && s.trading_date == trading_date && s.bucket <= bucket)
            .max_by_key(|(seq, s)| (s.bucket, s.timestamp, *seq))
            .map(|(_, s)| s.clone()))
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.samples.len();
        inner.samples.retain(|s| s.timestamp >= cutoff);
        Ok((before - inner.samples.len()) as u64)
    }

    async fn tickers(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        let mut tickers: Vec<String> = inner.samples.iter().map(|s| s.ticker.clone()).collect();
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}

#[async_trait]
impl MoverStore for MemoryStore {
    async fn replace_movers(&self, movers: &[Mover]) -> Result<(), StoreError> {
        let mut set: BTreeMap<_, Mover> = BTreeMap::new();
        for mover in movers {
            set.insert(mover.key(), mover.clone());
        }
        self.inner.write().await.movers = set.into_values().collect();
        Ok(())
    }

    async fn movers(&self) -> Result<Vec<Mover>, StoreError> {
        Ok(self.inner.read().await.movers.clone())
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn completion_marker(&self) -> Result<Option<NaiveDate>, StoreError> {
        Ok(self.inner.read().await.marker)
    }

    async fn commit_daily(&self, stats: &[TickerStat], date: NaiveDate) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for stat in stats {
            inner.stats.insert(stat.ticker.clone(), stat.clone());
        }
        inner.marker = Some(date);
        Ok(())
    }

    async fn ticker_stats(&self) -> Result<Vec<TickerStat>, StoreError> {
        Ok(self.inner.read().await.stats.values().cloned().collect())
    }

    async fn ticker_stat(&self, ticker: &str) -> Result<Option<TickerStat>, StoreError> {
        Ok(self.inner.read().await.stats.get(ticker).cloned())
    }
}
