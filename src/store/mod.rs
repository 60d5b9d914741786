//! Persistence module
//!
//! The price history, the current mover set, the per-ticker baseline
//! statistics and the daily completion marker. Backends implement the three
//! traits below; [`SqliteStore`] is the durable one and [`MemoryStore`]
//! serves tests and dry runs.

mod memory;
mod schema;
mod sqlite;
mod types;

pub use memory::MemoryStore;
pub use schema::migrate;
pub use sqlite::SqliteStore;
pub use types::{PriceSample, StoreError};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::baseline::TickerStat;
use crate::momentum::Mover;

/// Append-only, time-bucketed price history
#[async_trait]
pub trait PriceHistory: Send + Sync {
    /// Add one sample; duplicate buckets are legal
    async fn append(&self, sample: PriceSample) -> Result<(), StoreError>;

    /// Add a batch of samples atomically; returns the number written
    async fn append_batch(&self, samples: &[PriceSample]) -> Result<usize, StoreError>;

    /// Most recent sample for a ticker by timestamp
    async fn latest(&self, ticker: &str) -> Result<Option<PriceSample>, StoreError>;

    /// Sample with the largest bucket <= `bucket` for the ticker and date,
    /// tie-broken by most recent timestamp
    async fn at_or_before(
        &self,
        ticker: &str,
        trading_date: NaiveDate,
        bucket: u32,
    ) -> Result<Option<PriceSample>, StoreError>;

    /// Delete samples taken before `cutoff`; returns rows removed
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Distinct tickers currently held
    async fn tickers(&self) -> Result<Vec<String>, StoreError>;

    /// Delete samples older than `older_than` relative to now
    async fn purge(&self, older_than: chrono::Duration) -> Result<u64, StoreError> {
        self.purge_before(Utc::now() - older_than).await
    }
}

/// The current mover snapshot
#[async_trait]
pub trait MoverStore: Send + Sync {
    /// Replace the whole mover set in one atomic step
    async fn replace_movers(&self, movers: &[Mover]) -> Result<(), StoreError>;

    /// Current mover set ordered by category, then ticker
    async fn movers(&self) -> Result<Vec<Mover>, StoreError>;
}

/// Per-ticker baseline statistics and the daily completion marker
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Trading date of the last completed baseline run
    async fn completion_marker(&self) -> Result<Option<NaiveDate>, StoreError>;

    /// Upsert all stats and set the completion marker to `date`, atomically
    async fn commit_daily(&self, stats: &[TickerStat], date: NaiveDate) -> Result<(), StoreError>;

    /// All stats ordered by ticker
    async fn ticker_stats(&self) -> Result<Vec<TickerStat>, StoreError>;

    /// Stats for one ticker
    async fn ticker_stat(&self, ticker: &str) -> Result<Option<TickerStat>, StoreError>;
}

/// Everything the engine persists
pub trait Store: PriceHistory + MoverStore + StatsStore {}

impl<T: PriceHistory + MoverStore + StatsStore> Store for T {}
