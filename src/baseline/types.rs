//! Baseline statistics types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::ProviderError;
use crate::store::StoreError;

/// Slow, per-ticker statistics recomputed once per trading day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerStat {
    pub ticker: String,
    /// Simple moving average of the last `window` closes
    pub moving_average: Decimal,
    /// Mean of `high - low` over the same bars
    pub swing_average: Decimal,
    /// Return covariance with the benchmark over benchmark return variance
    pub beta: f64,
    /// Trading date the stats were computed for
    pub as_of: NaiveDate,
}

/// Progress of the baseline run for one trading date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineState {
    /// Not yet completed today; the next invocation will run
    Pending,
    /// A run is in flight in this process
    Running,
    /// The completion marker holds today's date
    Completed,
}

/// What a completed or skipped invocation did
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BaselineReport {
    /// Tickers whose stats were written
    pub updated: usize,
    /// Tickers skipped for missing or insufficient bars
    pub skipped: Vec<String>,
}

/// Result of `BaselineEngine::run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaselineOutcome {
    /// The marker already held today's date; nothing was done
    AlreadyCompleted,
    /// Stats and marker were written
    Completed(BaselineReport),
    /// No ticker produced stats; nothing was written and today stays pending
    NothingToWrite(BaselineReport),
}

/// Errors that abort a baseline run; the marker is never written
#[derive(Debug, Error)]
pub enum BaselineError {
    /// Another run of this engine is in flight
    #[error("Baseline run already in progress")]
    AlreadyRunning,
    /// The benchmark series could not be fetched
    #[error("Benchmark {symbol} fetch failed: {source}")]
    Benchmark {
        symbol: String,
        #[source]
        source: ProviderError,
    },
    /// The benchmark series is too short for the return window
    #[error("Benchmark {symbol} has {bars} bars, need {required}")]
    InsufficientBenchmark {
        symbol: String,
        bars: usize,
        required: usize,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
