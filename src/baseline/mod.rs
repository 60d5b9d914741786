//! Baseline statistics module
//!
//! Once per trading day: 50-bar moving average, average daily swing and beta
//! against a benchmark for every watchlist ticker.

mod engine;
pub mod stats;
mod types;

pub use engine::BaselineEngine;
pub use types::{BaselineError, BaselineOutcome, BaselineReport, BaselineState, TickerStat};
