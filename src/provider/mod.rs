//! Market data provider module
//!
//! Latest snapshots for ingestion and daily bars for the baseline engine.

mod polygon;
mod types;

pub use polygon::{PolygonClient, PolygonConfig};
pub use types::{DailyBar, ProviderError, Snapshot};

use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait for market data provider implementations
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest snapshot for each ticker the provider knows
    async fn latest_snapshots(&self, tickers: &[String]) -> Result<Vec<Snapshot>, ProviderError>;

    /// Daily bars between `start` and `end` inclusive, in any order
    async fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ProviderError>;
}
