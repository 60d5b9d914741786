//! Watchlist sources

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{normalize_tickers, WatchlistError, WatchlistSource};
use crate::config::WatchlistConfig;

/// Tickers read from one column of a CSV file with a header row
#[derive(Debug, Clone)]
pub struct CsvWatchlist {
    path: PathBuf,
    column: String,
}

impl CsvWatchlist {
    pub fn new(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            column: column.into(),
        }
    }

    pub fn from_config(config: &WatchlistConfig) -> Self {
        Self::new(config.path.clone(), config.column.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse CSV content; the column match ignores case and surrounding spaces
    pub fn parse(content: &[u8], column: &str) -> Result<Vec<String>, WatchlistError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content);

        let index = reader
            .headers()?
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column.trim()))
            .ok_or_else(|| WatchlistError::MissingColumn(column.to_string()))?;

        let mut raw = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(value) = record.get(index) {
                raw.push(value.to_string());
            }
        }

        Ok(normalize_tickers(raw))
    }
}

#[async_trait]
impl WatchlistSource for CsvWatchlist {
    async fn load_tickers(&self) -> Result<Vec<String>, WatchlistError> {
        let content = tokio::fs::read(&self.path)
            .await
            .map_err(|source| WatchlistError::Io {
                path: self.path.clone(),
                source,
            })?;

        let tickers = Self::parse(&content, &self.column)?;
        tracing::debug!(path = %self.path.display(), count = tickers.len(), "Watchlist loaded");
        Ok(tickers)
    }
}

/// Fixed ticker list
#[derive(Debug, Clone, Default)]
pub struct StaticWatchlist {
    tickers: Vec<String>,
}

impl StaticWatchlist {
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tickers: normalize_tickers(tickers),
        }
    }
}

#[async_trait]
impl WatchlistSource for StaticWatchlist {
    async fn load_tickers(&self) -> Result<Vec<String>, WatchlistError> {
        Ok(self.tickers.clone())
    }
}
