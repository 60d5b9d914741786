//! Once-per-day baseline engine
//!
//! Fetches the benchmark series first; without it nothing runs. Each ticker
//! is then fetched and reduced independently, and everything that succeeded
//! is committed together with the completion marker.

use chrono::{Days, NaiveDate};
use futures_util::{stream, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use super::stats;
use super::types::{BaselineError, BaselineOutcome, BaselineReport, BaselineState, TickerStat};
use crate::config::BaselineConfig;
use crate::provider::{MarketDataProvider, ProviderError};
use crate::store::{StatsStore, Store, StoreError};
use crate::telemetry::{increment_counter, record_latency, CounterMetric, LatencyMetric};

/// Benchmark returns shared by every ticker in one run
struct BenchmarkSeries {
    returns: Vec<f64>,
    variance: f64,
}

/// Why a ticker produced no stats
enum Skip {
    Fetch(ProviderError),
    InsufficientBars(usize),
}

/// Daily baseline statistics engine
pub struct BaselineEngine {
    store: Arc<dyn Store>,
    provider: Arc<dyn MarketDataProvider>,
    config: BaselineConfig,
    run_lock: Mutex<()>,
}

impl BaselineEngine {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn MarketDataProvider>,
        config: BaselineConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// State of the run for `today`
    pub async fn status(&self, today: NaiveDate) -> Result<BaselineState, StoreError> {
        if self.run_lock.try_lock().is_err() {
            return Ok(BaselineState::Running);
        }
        Ok(match self.store.completion_marker().await? {
            Some(date) if date == today => BaselineState::Completed,
            _ => BaselineState::Pending,
        })
    }

    /// Compute and commit stats for `tickers` unless `today` is already done
    ///
    /// Benchmark failures abort the run with nothing written. Tickers whose
    /// bars cannot be fetched or are too short are skipped.
    pub async fn run(
        &self,
        today: NaiveDate,
        tickers: &[String],
    ) -> Result<BaselineOutcome, BaselineError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| BaselineError::AlreadyRunning)?;

        if self.store.completion_marker().await? == Some(today) {
            tracing::debug!(date = %today, "Baseline already completed");
            return Ok(BaselineOutcome::AlreadyCompleted);
        }

        let started = Instant::now();
        let start = today
            .checked_sub_days(Days::new(u64::from(self.config.lookback_days)))
            .unwrap_or(NaiveDate::MIN);

        tracing::info!(
            date = %today,
            tickers = tickers.len(),
            benchmark = %self.config.benchmark,
            "Starting baseline run"
        );

        let benchmark = self.benchmark_series(start, today).await?;

        let unique: BTreeSet<String> = tickers.iter().cloned().collect();
        let results: Vec<(String, Result<TickerStat, Skip>)> = stream::iter(unique)
            .map(|ticker| {
                let benchmark = &benchmark;
                async move {
                    let result = self.ticker_stat(&ticker, start, today, benchmark).await;
                    (ticker, result)
                }
            })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut stats = Vec::new();
        let mut report = BaselineReport::default();
        for (ticker, result) in results {
            match result {
                Ok(stat) => stats.push(stat),
                Err(Skip::Fetch(e)) => {
                    tracing::warn!(ticker = %ticker, error = %e, "Daily bar fetch failed, skipping");
                    report.skipped.push(ticker);
                }
                Err(Skip::InsufficientBars(bars)) => {
                    tracing::debug!(
                        ticker = %ticker,
                        bars,
                        required = self.config.window,
                        "Insufficient history, skipping"
                    );
                    report.skipped.push(ticker);
                }
            }
        }
        stats.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        report.skipped.sort();
        report.updated = stats.len();

        increment_counter(CounterMetric::BaselineTickersSkipped, report.skipped.len() as u64);

        if stats.is_empty() {
            tracing::warn!(
                date = %today,
                skipped = report.skipped.len(),
                "No ticker produced stats, leaving baseline pending"
            );
            return Ok(BaselineOutcome::NothingToWrite(report));
        }

        self.store.commit_daily(&stats, today).await?;

        increment_counter(CounterMetric::BaselineTickersUpdated, report.updated as u64);
        record_latency(LatencyMetric::BaselineRun, started.elapsed());
        tracing::info!(
            date = %today,
            updated = report.updated,
            skipped = report.skipped.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Baseline run complete"
        );

        Ok(BaselineOutcome::Completed(report))
    }

    async fn benchmark_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BenchmarkSeries, BaselineError> {
        let symbol = &self.config.benchmark;
        let mut bars = self
            .provider
            .daily_bars(symbol, start, end)
            .await
            .map_err(|source| BaselineError::Benchmark {
                symbol: symbol.clone(),
                source,
            })?;

        if bars.len() < self.config.window {
            return Err(BaselineError::InsufficientBenchmark {
                symbol: symbol.clone(),
                bars: bars.len(),
                required: self.config.window,
            });
        }

        stats::sort_chronologically(&mut bars);
        let returns = stats::returns(&stats::return_closes(&bars, self.config.window));
        let variance = stats::sample_variance(&returns);

        tracing::debug!(
            benchmark = %symbol,
            bars = bars.len(),
            variance,
            "Benchmark series ready"
        );

        Ok(BenchmarkSeries { returns, variance })
    }

    async fn ticker_stat(
        &self,
        ticker: &str,
        start: NaiveDate,
        today: NaiveDate,
        benchmark: &BenchmarkSeries,
    ) -> Result<TickerStat, Skip> {
        let mut bars = self
            .provider
            .daily_bars(ticker, start, today)
            .await
            .map_err(Skip::Fetch)?;

        let window = self.config.window;
        stats::sort_chronologically(&mut bars);

        let (Some(moving_average), Some(swing_average)) = (
            stats::moving_average(&bars, window),
            stats::swing_average(&bars, window),
        ) else {
            return Err(Skip::InsufficientBars(bars.len()));
        };

        let returns = stats::returns(&stats::return_closes(&bars, window));
        let beta = stats::beta(
            &returns,
            &benchmark.returns,
            benchmark.variance,
            self.config.min_overlap,
        );

        Ok(TickerStat {
            ticker: ticker.to_string(),
            moving_average,
            swing_average,
            beta,
            as_of: today,
        })
    }
}
