//! Watchlist error types

use std::path::PathBuf;
use thiserror::Error;

/// Watchlist loading errors
#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("Failed to read watchlist {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed watchlist: {0}")]
    Csv(#[from] csv::Error),
    #[error("Watchlist has no {0:?} column")]
    MissingColumn(String),
}
