//! Configuration types for market-movers

use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::telemetry::LogFormat;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub watchlist: WatchlistConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub momentum: MomentumConfig,
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SQLite connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// How long price samples are kept before the rolling purge removes them
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,

    /// SQLite busy timeout applied to every connection
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Longest retention accepted: one year
pub const MAX_RETENTION_HOURS: u64 = 24 * 366;

fn default_database_url() -> String {
    "sqlite://market_movers.db".to_string()
}
fn default_retention_hours() -> u64 {
    3
}
fn default_busy_timeout_ms() -> u64 {
    5_000
}
fn default_max_connections() -> u32 {
    8
}

impl StoreConfig {
    /// Retention window, capped at [`MAX_RETENTION_HOURS`]
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.retention_hours.min(MAX_RETENTION_HOURS) as i64)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            retention_hours: default_retention_hours(),
            busy_timeout_ms: default_busy_timeout_ms(),
            max_connections: default_max_connections(),
        }
    }
}

/// Bounded retry for store and provider operations
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Upper bound on any single store call or external fetch
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_initial_delay_ms() -> u64 {
    200
}
fn default_max_delay_ms() -> u64 {
    5_000
}
fn default_operation_timeout_secs() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            operation_timeout_secs: default_operation_timeout_secs(),
        }
    }
}

/// Market data provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    /// API key; falls back to the POLYGON_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_url() -> String {
    "https://api.polygon.io".to_string()
}
fn default_provider_timeout_secs() -> u64 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            api_key: None,
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Resolve the API key from config or environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("POLYGON_API_KEY").ok())
    }
}

/// Watchlist source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistConfig {
    #[serde(default = "default_watchlist_path")]
    pub path: PathBuf,
    /// CSV column holding the ticker symbols
    #[serde(default = "default_watchlist_column")]
    pub column: String,
}

fn default_watchlist_path() -> PathBuf {
    PathBuf::from("Watchlist.csv")
}
fn default_watchlist_column() -> String {
    "Ticker".to_string()
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            path: default_watchlist_path(),
            column: default_watchlist_column(),
        }
    }
}

/// Exchange session boundaries, in local hours
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_pre_market_start")]
    pub pre_market_start: u32,
    #[serde(default = "default_regular_start")]
    pub regular_start: u32,
    #[serde(default = "default_post_market_start")]
    pub post_market_start: u32,
    #[serde(default = "default_post_market_end")]
    pub post_market_end: u32,
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}
fn default_pre_market_start() -> u32 {
    4
}
fn default_regular_start() -> u32 {
    9
}
fn default_post_market_start() -> u32 {
    16
}
fn default_post_market_end() -> u32 {
    20
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            pre_market_start: default_pre_market_start(),
            regular_start: default_regular_start(),
            post_market_start: default_post_market_start(),
            post_market_end: default_post_market_end(),
        }
    }
}

/// A single momentum horizon with its ripper/dipper thresholds (percent)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HorizonConfig {
    /// Category prefix, e.g. "1m" yields "1m_ripper" / "1m_dipper"
    pub label: String,
    /// Lookback in buckets; absent means "against previous close"
    #[serde(default)]
    pub offset_buckets: Option<u32>,
    pub ripper_pct: Decimal,
    pub dipper_pct: Decimal,
}

/// Momentum classification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MomentumConfig {
    #[serde(default = "default_horizons")]
    pub horizons: Vec<HorizonConfig>,

    /// Tickers evaluated concurrently per cycle
    #[serde(default = "default_momentum_concurrency")]
    pub max_concurrency: usize,
}

fn default_horizons() -> Vec<HorizonConfig> {
    vec![
        HorizonConfig {
            label: "1m".to_string(),
            offset_buckets: Some(1),
            ripper_pct: Decimal::new(2, 1), // 0.2%
            dipper_pct: Decimal::new(2, 1),
        },
        HorizonConfig {
            label: "5m".to_string(),
            offset_buckets: Some(5),
            ripper_pct: Decimal::new(5, 1), // 0.5%
            dipper_pct: Decimal::new(5, 1),
        },
        HorizonConfig {
            label: "30m".to_string(),
            offset_buckets: Some(30),
            ripper_pct: Decimal::ONE, // 1.0%
            dipper_pct: Decimal::ONE,
        },
        HorizonConfig {
            label: "day".to_string(),
            offset_buckets: None,
            ripper_pct: Decimal::TWO, // 2.0%
            dipper_pct: Decimal::TWO,
        },
    ]
}
fn default_momentum_concurrency() -> usize {
    16
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            horizons: default_horizons(),
            max_concurrency: default_momentum_concurrency(),
        }
    }
}

/// Daily baseline statistics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BaselineConfig {
    /// Benchmark symbol used for beta
    #[serde(default = "default_benchmark")]
    pub benchmark: String,

    /// Calendar days of daily bars requested per symbol
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Trading bars used for the moving average, swing and return series
    #[serde(default = "default_window")]
    pub window: usize,

    /// Minimum aligned return count for a non-zero beta
    #[serde(default = "default_min_overlap")]
    pub min_overlap: usize,

    /// Tickers fetched concurrently
    #[serde(default = "default_baseline_concurrency")]
    pub max_concurrency: usize,
}

fn default_benchmark() -> String {
    "SPY".to_string()
}
fn default_lookback_days() -> u32 {
    150
}
fn default_window() -> usize {
    50
}
fn default_min_overlap() -> usize {
    10
}
fn default_baseline_concurrency() -> usize {
    4
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            benchmark: default_benchmark(),
            lookback_days: default_lookback_days(),
            window: default_window(),
            min_overlap: default_min_overlap(),
            max_concurrency: default_baseline_concurrency(),
        }
    }
}

/// Periodic task cadence
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_ingest_interval")]
    pub ingest_interval_secs: u64,
    #[serde(default = "default_classify_interval")]
    pub classify_interval_secs: u64,
    /// How often the baseline task checks whether today's run is done
    #[serde(default = "default_baseline_interval")]
    pub baseline_interval_secs: u64,
}

fn default_ingest_interval() -> u64 {
    30
}
fn default_classify_interval() -> u64 {
    60
}
fn default_baseline_interval() -> u64 {
    3600
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            ingest_interval_secs: default_ingest_interval(),
            classify_interval_secs: default_classify_interval(),
            baseline_interval_secs: default_baseline_interval(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut labels = HashSet::new();
        for horizon in &self.momentum.horizons {
            if horizon.label.is_empty() {
                bail!("momentum horizon label must not be empty");
            }
            if !labels.insert(horizon.label.as_str()) {
                bail!("duplicate momentum horizon label: {}", horizon.label);
            }
            if horizon.ripper_pct.is_sign_negative() || horizon.dipper_pct.is_sign_negative() {
                bail!(
                    "momentum thresholds for {} must be non-negative",
                    horizon.label
                );
            }
        }

        if self.store.retention_hours == 0 || self.store.retention_hours > MAX_RETENTION_HOURS {
            bail!(
                "store retention_hours must be between 1 and {}",
                MAX_RETENTION_HOURS
            );
        }

        if self.baseline.window < 2 {
            bail!("baseline window must be at least 2 bars");
        }
        if self.momentum.max_concurrency == 0 || self.baseline.max_concurrency == 0 {
            bail!("max_concurrency must be positive");
        }

        self.session
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone {}: {}", self.session.timezone, e))?;

        let s = &self.session;
        if !(s.pre_market_start <= s.regular_start
            && s.regular_start <= s.post_market_start
            && s.post_market_start <= s.post_market_end
            && s.post_market_end <= 24)
        {
            bail!("session boundaries must be ordered within 0..=24");
        }

        Ok(())
    }
}
