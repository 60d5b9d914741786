//! Momentum classification module
//!
//! Flags "movers": tickers whose latest price moved beyond a configured
//! percent threshold over a bucket lookback (1/5/30 minutes by default) or
//! against the previous close.

mod classifier;
mod types;

pub use classifier::{
    classify_ticker, percent_change, price_at_offset, CycleSummary, MomentumClassifier,
};
pub use types::{Direction, Horizon, Lookback, Mover, MoverCategory};
