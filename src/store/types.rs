//! Price history and store error types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::retry::Retryable;
use crate::session::Session;

/// One price observation for a ticker, keyed by trading date and minute bucket
///
/// Immutable once written. Several samples may share a bucket; the one with
/// the latest timestamp is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub ticker: String,
    /// Exchange-local calendar date
    pub trading_date: NaiveDate,
    /// Minutes since local midnight
    pub bucket: u32,
    pub session: Session,
    pub price: Decimal,
    pub day_open: Decimal,
    pub prev_close: Decimal,
    /// Wall-clock time the sample was taken
    pub timestamp: DateTime<Utc>,
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer holds the database; safe to retry
    #[error("Store busy: {0}")]
    Busy(String),
    /// The operation did not finish in time; safe to retry
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
    /// Any other database failure
    #[error("Database error: {0}")]
    Database(String),
    /// A persisted row could not be decoded
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Busy(_) | StoreError::Timeout(_))
    }

    fn timed_out(after: Duration) -> Self {
        StoreError::Timeout(after)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut => StoreError::Busy("connection pool timed out".to_string()),
            sqlx::Error::Database(db) if is_busy_code(db.code().as_deref(), db.message()) => {
                StoreError::Busy(db.message().to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                StoreError::Corrupt(e.to_string())
            }
            _ => StoreError::Database(e.to_string()),
        }
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes
fn is_busy_code(code: Option<&str>, message: &str) -> bool {
    let primary = code
        .and_then(|c| c.parse::<i32>().ok())
        .map(|c| c & 0xff);
    matches!(primary, Some(5) | Some(6))
        || message.contains("database is locked")
        || message.contains("database is busy")
}
