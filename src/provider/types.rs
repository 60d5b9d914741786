//! Market data types

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::retry::Retryable;

/// Latest quote state for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ticker: String,
    /// Last trade price; absent before the first trade
    pub price: Option<Decimal>,
    pub day_open: Option<Decimal>,
    pub prev_close: Option<Decimal>,
    /// Provider timestamp of the snapshot
    pub updated: DateTime<Utc>,
}

/// One daily OHLC bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Start of the bar
    pub timestamp: DateTime<Utc>,
}

/// Market data provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No API key configured")]
    MissingApiKey,
    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) | ProviderError::Timeout(_) => true,
            ProviderError::Http { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ProviderError::MissingApiKey
            | ProviderError::Decode(_)
            | ProviderError::InvalidUrl(_) => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        ProviderError::Timeout(after)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}
