//! Polygon.io REST client
//!
//! Snapshots come from the v2 all-tickers snapshot endpoint and daily bars
//! from the v2 aggregates endpoint. Every request is time-bounded and
//! retried on transport errors, 429 and 5xx responses.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{DailyBar, MarketDataProvider, ProviderError, Snapshot};
use crate::config::ProviderConfig;
use crate::retry::{with_retry, RetryPolicy};

/// Polygon API base URL
pub const POLYGON_API_URL: &str = "https://api.polygon.io";

/// Tickers per snapshot request, keeps the query string bounded
const SNAPSHOT_CHUNK: usize = 250;

/// Configuration for the Polygon client
#[derive(Debug, Clone)]
pub struct PolygonConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// API key; requests fail with `MissingApiKey` without one
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for PolygonConfig {
    fn default() -> Self {
        Self {
            base_url: POLYGON_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&ProviderConfig> for PolygonConfig {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.resolve_api_key(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Client for Polygon's REST API
pub struct PolygonClient {
    config: PolygonConfig,
    client: Client,
    retry: RetryPolicy,
}

impl PolygonClient {
    /// Create a client with the given configuration and retry policy
    pub fn new(config: PolygonConfig, retry: RetryPolicy) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            config,
            client,
            retry,
        })
    }

    /// Whether an API key is available
    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey)?;

        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("apiKey", api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http { status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    /// Aggregates URL with the ticker as one encoded path segment
    fn aggs_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Url, ProviderError> {
        let invalid = || ProviderError::InvalidUrl(self.config.base_url.clone());
        let mut url = Url::parse(&self.config.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["v2", "aggs", "ticker", ticker, "range", "1", "day"])
            .push(&start.format("%Y-%m-%d").to_string())
            .push(&end.format("%Y-%m-%d").to_string());
        Ok(url)
    }

    async fn fetch_snapshot_chunk(&self, tickers: &[String]) -> Result<Vec<Snapshot>, ProviderError> {
        let url = format!(
            "{}/v2/snapshot/locale/us/markets/stocks/tickers",
            self.config.base_url
        );
        let query = [("tickers", tickers.join(","))];

        let response: SnapshotResponse =
            with_retry(&self.retry, "polygon_snapshot", || self.get_json(&url, &query)).await?;

        Ok(response
            .tickers
            .into_iter()
            .map(PolygonTicker::into_snapshot)
            .collect())
    }
}

#[async_trait]
impl MarketDataProvider for PolygonClient {
    async fn latest_snapshots(&self, tickers: &[String]) -> Result<Vec<Snapshot>, ProviderError> {
        let mut snapshots = Vec::with_capacity(tickers.len());
        for chunk in tickers.chunks(SNAPSHOT_CHUNK) {
            snapshots.extend(self.fetch_snapshot_chunk(chunk).await?);
        }

        tracing::debug!(
            requested = tickers.len(),
            received = snapshots.len(),
            "Fetched snapshots"
        );

        Ok(snapshots)
    }

    async fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ProviderError> {
        let url = self.aggs_url(ticker, start, end)?;
        let query = [
            ("adjusted", "true".to_string()),
            ("sort", "asc".to_string()),
            ("limit", "50000".to_string()),
        ];

        let response: AggsResponse =
            with_retry(&self.retry, "polygon_daily_bars", || {
                self.get_json(url.as_str(), &query)
            })
            .await?;

        response
            .results
            .into_iter()
            .map(|agg| agg.into_bar(ticker))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    #[serde(default)]
    tickers: Vec<PolygonTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolygonTicker {
    ticker: String,
    #[serde(default)]
    day: Option<PolygonDay>,
    #[serde(default)]
    last_trade: Option<PolygonTrade>,
    #[serde(default)]
    prev_day: Option<PolygonDay>,
    /// Nanoseconds since epoch
    #[serde(default)]
    updated: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PolygonDay {
    #[serde(default)]
    o: Option<Decimal>,
    #[serde(default)]
    c: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct PolygonTrade {
    #[serde(default)]
    p: Option<Decimal>,
    /// Nanoseconds since epoch
    #[serde(default)]
    t: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AggsResponse {
    #[serde(default)]
    results: Vec<PolygonAgg>,
}

#[derive(Debug, Deserialize)]
struct PolygonAgg {
    o: Decimal,
    h: Decimal,
    l: Decimal,
    c: Decimal,
    /// Milliseconds since epoch
    t: i64,
}

/// Polygon reports zero for fields with no trading yet
fn non_zero(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| !v.is_zero())
}

impl PolygonTicker {
    fn into_snapshot(self) -> Snapshot {
        let trade_ts = self.last_trade.as_ref().and_then(|t| t.t);
        let updated = self
            .updated
            .or(trade_ts)
            .map(DateTime::from_timestamp_nanos)
            .unwrap_or_else(Utc::now);

        Snapshot {
            ticker: self.ticker.to_uppercase(),
            price: non_zero(self.last_trade.and_then(|t| t.p)),
            day_open: non_zero(self.day.and_then(|d| d.o)),
            prev_close: non_zero(self.prev_day.and_then(|d| d.c)),
            updated,
        }
    }
}

impl PolygonAgg {
    fn into_bar(self, ticker: &str) -> Result<DailyBar, ProviderError> {
        let timestamp = DateTime::from_timestamp_millis(self.t).ok_or_else(|| {
            ProviderError::Decode(format!("bar timestamp out of range for {}: {}", ticker, self.t))
        })?;

        Ok(DailyBar {
            open: self.o,
            high: self.h,
            low: self.l,
            close: self.c,
            timestamp,
        })
    }
}
