//! Prometheus metrics

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// One ingestion cycle
    IngestCycle,
    /// One momentum classification cycle
    ClassifyCycle,
    /// One baseline statistics run
    BaselineRun,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Price samples appended to history
    SamplesIngested,
    /// Samples removed by the retention purge
    SamplesPurged,
    /// Tickers updated by the baseline engine
    BaselineTickersUpdated,
    /// Tickers skipped by the baseline engine
    BaselineTickersSkipped,
    /// Retry attempts after transient failures
    Retries,
    /// Periodic task invocations that returned an error
    TaskFailures,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Size of the current mover set
    Movers,
    /// Tickers on the watchlist
    WatchlistSize,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::IngestCycle => "movers_ingest_cycle_ms",
        LatencyMetric::ClassifyCycle => "movers_classify_cycle_ms",
        LatencyMetric::BaselineRun => "movers_baseline_run_ms",
    };

    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a counter
pub fn increment_counter(metric: CounterMetric, value: u64) {
    let metric_name = match metric {
        CounterMetric::SamplesIngested => "movers_samples_ingested_total",
        CounterMetric::SamplesPurged => "movers_samples_purged_total",
        CounterMetric::BaselineTickersUpdated => "movers_baseline_tickers_updated_total",
        CounterMetric::BaselineTickersSkipped => "movers_baseline_tickers_skipped_total",
        CounterMetric::Retries => "movers_retries_total",
        CounterMetric::TaskFailures => "movers_task_failures_total",
    };

    metrics::counter!(metric_name).increment(value);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::Movers => "movers_current_movers",
        GaugeMetric::WatchlistSize => "movers_watchlist_size",
    };

    metrics::gauge!(metric_name).set(value);
}
