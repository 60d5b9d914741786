//! Watchlist module
//!
//! The set of tickers every task works on, reloaded on each cycle so edits
//! to the source take effect without a restart.

mod source;
mod types;

pub use source::{CsvWatchlist, StaticWatchlist};
pub use types::WatchlistError;

use async_trait::async_trait;

/// Trait for watchlist sources
#[async_trait]
pub trait WatchlistSource: Send + Sync {
    /// Uppercase, unique tickers in source order
    async fn load_tickers(&self) -> Result<Vec<String>, WatchlistError>;
}

/// Trim, uppercase and dedupe tickers, keeping first-seen order
pub fn normalize_tickers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .map(|t| t.as_ref().trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
