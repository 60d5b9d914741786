//! Ingestion types

use thiserror::Error;

use crate::provider::ProviderError;
use crate::store::StoreError;
use crate::watchlist::WatchlistError;

/// Result of one ingestion cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Tickers requested from the provider
    pub tickers: usize,
    /// Samples appended
    pub samples: usize,
    /// Snapshots dropped for lacking a trade price
    pub skipped: usize,
    /// Samples removed by the retention purge
    pub purged: u64,
}

/// Errors that fail an ingestion cycle
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Watchlist(#[from] WatchlistError),
    #[error("Snapshot fetch failed: {0}")]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
