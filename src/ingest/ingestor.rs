//! Snapshot ingestion

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

use super::types::{IngestError, IngestSummary};
use crate::provider::{MarketDataProvider, Snapshot};
use crate::session::{SessionClock, SessionStamp};
use crate::store::{PriceHistory, PriceSample, Store};
use crate::telemetry::{
    increment_counter, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};
use crate::watchlist::WatchlistSource;

/// Build a sample from a snapshot, or `None` when it carries no trade price
///
/// A missing day open or previous close falls back to the trade price.
pub fn sample_from_snapshot(snapshot: &Snapshot, stamp: SessionStamp, now: DateTime<Utc>) -> Option<PriceSample> {
    let price = snapshot.price?;

    Some(PriceSample {
        ticker: snapshot.ticker.clone(),
        trading_date: stamp.trading_date,
        bucket: stamp.bucket,
        session: stamp.session,
        price,
        day_open: snapshot.day_open.unwrap_or(price),
        prev_close: snapshot.prev_close.unwrap_or(price),
        timestamp: now,
    })
}

/// Periodic snapshot ingestor
pub struct Ingestor {
    store: Arc<dyn Store>,
    provider: Arc<dyn MarketDataProvider>,
    watchlist: Arc<dyn WatchlistSource>,
    clock: SessionClock,
    retention: chrono::Duration,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn MarketDataProvider>,
        watchlist: Arc<dyn WatchlistSource>,
        clock: SessionClock,
        retention: chrono::Duration,
    ) -> Self {
        Self {
            store,
            provider,
            watchlist,
            clock,
            retention,
        }
    }

    /// Ingest one round of snapshots taken at `now`
    ///
    /// An empty watchlist is a no-op. The purge runs after the append, so a
    /// cycle never removes the samples it just wrote.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<IngestSummary, IngestError> {
        let started = Instant::now();

        let tickers = self.watchlist.load_tickers().await?;
        set_gauge(GaugeMetric::WatchlistSize, tickers.len() as f64);
        if tickers.is_empty() {
            tracing::info!("Empty watchlist, skipping ingestion");
            return Ok(IngestSummary::default());
        }

        let snapshots = self.provider.latest_snapshots(&tickers).await?;
        let stamp = self.clock.stamp(now);

        let samples: Vec<PriceSample> = snapshots
            .iter()
            .filter_map(|snapshot| sample_from_snapshot(snapshot, stamp, now))
            .collect();
        let skipped = snapshots.len() - samples.len();
        if skipped > 0 {
            tracing::debug!(skipped, "Snapshots without a trade price");
        }

        let written = self.store.append_batch(&samples).await?;
        let purged = self.store.purge_before(now - self.retention).await?;

        increment_counter(CounterMetric::SamplesIngested, written as u64);
        increment_counter(CounterMetric::SamplesPurged, purged);
        record_latency(LatencyMetric::IngestCycle, started.elapsed());

        let summary = IngestSummary {
            tickers: tickers.len(),
            samples: written,
            skipped,
            purged,
        };

        tracing::info!(
            tickers = summary.tickers,
            samples = summary.samples,
            purged = summary.purged,
            session = %stamp.session,
            bucket = stamp.bucket,
            "Ingestion cycle complete"
        );

        Ok(summary)
    }
}
