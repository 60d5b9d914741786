//! SQLite-backed store
//!
//! One pool shared by every task. WAL mode lets the classifier read while
//! ingestion writes; remaining lock contention surfaces as `StoreError::Busy`
//! and goes through the retry policy. Multi-row writes run in a single
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

use super::schema::{migrate, BASELINE_MARKER_KEY};
use super::{MoverStore, PriceHistory, PriceSample, StatsStore, StoreError};
use crate::baseline::TickerStat;
use crate::config::StoreConfig;
use crate::momentum::{Mover, MoverCategory};
use crate::retry::{with_retry, RetryPolicy};
use crate::session::Session;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Durable store over a SQLite database
pub struct SqliteStore {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl SqliteStore {
    /// Open (creating if missing) the database and ensure the schema exists
    pub async fn connect(config: &StoreConfig, retry: RetryPolicy) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(retry.timeout)
            .connect_with(options)
            .await?;

        migrate(&pool).await?;

        tracing::info!(
            database_url = %config.database_url,
            max_connections = config.max_connections,
            "Store connected"
        );

        Ok(Self { pool, retry })
    }

    /// Wrap an existing pool; the schema must already exist
    pub fn from_pool(pool: SqlitePool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// Close all connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn append_batch_once(&self, samples: &[PriceSample]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        for sample in samples {
            sqlx::query(
                "INSERT INTO price_samples \
                 (ticker, trading_date, bucket, session, price, day_open, prev_close, ts_micros) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&sample.ticker)
            .bind(sample.trading_date.format(DATE_FORMAT).to_string())
            .bind(i64::from(sample.bucket))
            .bind(sample.session.as_str())
            .bind(sample.price.to_string())
            .bind(sample.day_open.to_string())
            .bind(sample.prev_close.to_string())
            .bind(sample.timestamp.timestamp_micros())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(samples.len())
    }

    async fn latest_once(&self, ticker: &str) -> Result<Option<PriceSample>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM price_samples WHERE ticker = ? \
             ORDER BY ts_micros DESC, id DESC LIMIT 1",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(sample_from_row).transpose()
    }

    async fn at_or_before_once(
        &self,
        ticker: &str,
        trading_date: NaiveDate,
        bucket: u32,
    ) -> Result<Option<PriceSample>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM price_samples \
             WHERE ticker = ? AND trading_date = ? AND bucket <= ? \
             ORDER BY bucket DESC, ts_micros DESC, id DESC LIMIT 1",
        )
        .bind(ticker)
        .bind(trading_date.format(DATE_FORMAT).to_string())
        .bind(i64::from(bucket))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(sample_from_row).transpose()
    }

    async fn purge_before_once(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM price_samples WHERE ts_micros < ?")
            .bind(cutoff.timestamp_micros())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn tickers_once(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT DISTINCT ticker FROM price_samples ORDER BY ticker")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("ticker").map_err(StoreError::from))
            .collect()
    }

    async fn replace_movers_once(&self, movers: &[Mover]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM movers").execute(&mut *tx).await?;

        for mover in movers {
            sqlx::query(
                "INSERT OR REPLACE INTO movers \
                 (category, ticker, price, change_pct, session, computed_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(mover.category.to_string())
            .bind(&mover.ticker)
            .bind(mover.price.to_string())
            .bind(mover.change_pct.to_string())
            .bind(mover.session.as_str())
            .bind(mover.computed_at.timestamp_micros())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn movers_once(&self) -> Result<Vec<Mover>, StoreError> {
        let rows = sqlx::query("SELECT * FROM movers")
            .fetch_all(&self.pool)
            .await?;

        let mut movers = rows
            .iter()
            .map(mover_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        movers.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(movers)
    }

    async fn completion_marker_once(&self) -> Result<Option<NaiveDate>, StoreError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM system_status WHERE key = ?")
                .bind(BASELINE_MARKER_KEY)
                .fetch_optional(&self.pool)
                .await?;

        value.as_deref().map(|v| parse_date("marker", v)).transpose()
    }

    async fn commit_daily_once(&self, stats: &[TickerStat], date: NaiveDate) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for stat in stats {
            sqlx::query(
                "INSERT INTO ticker_stats (ticker, moving_average, swing_average, beta, as_of) \
                 VALUES (?, ?, ?, ?, ?) \
                 ON CONFLICT(ticker) DO UPDATE SET \
                   moving_average = excluded.moving_average, \
                   swing_average = excluded.swing_average, \
                   beta = excluded.beta, \
                   as_of = excluded.as_of",
            )
            .bind(&stat.ticker)
            .bind(stat.moving_average.to_string())
            .bind(stat.swing_average.to_string())
            .bind(stat.beta)
            .bind(stat.as_of.format(DATE_FORMAT).to_string())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("INSERT OR REPLACE INTO system_status (key, value) VALUES (?, ?)")
            .bind(BASELINE_MARKER_KEY)
            .bind(date.format(DATE_FORMAT).to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn ticker_stats_once(&self, ticker: Option<&str>) -> Result<Vec<TickerStat>, StoreError> {
        let rows = match ticker {
            Some(ticker) => {
                sqlx::query("SELECT * FROM ticker_stats WHERE ticker = ?")
                    .bind(ticker)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM ticker_stats ORDER BY ticker")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(stat_from_row).collect()
    }
}

#[async_trait]
impl PriceHistory for SqliteStore {
    async fn append(&self, sample: PriceSample) -> Result<(), StoreError> {
        self.append_batch(std::slice::from_ref(&sample)).await.map(|_| ())
    }

    async fn append_batch(&self, samples: &[PriceSample]) -> Result<usize, StoreError> {
        if samples.is_empty() {
            return Ok(0);
        }
        with_retry(&self.retry, "store.append_batch", || {
            self.append_batch_once(samples)
        })
        .await
    }

    async fn latest(&self, ticker: &str) -> Result<Option<PriceSample>, StoreError> {
        with_retry(&self.retry, "store.latest", || self.latest_once(ticker)).await
    }

    async fn at_or_before(
        &self,
        ticker: &str,
        trading_date: NaiveDate,
        bucket: u32,
    ) -> Result<Option<PriceSample>, StoreError> {
        with_retry(&self.retry, "store.at_or_before", || {
            self.at_or_before_once(ticker, trading_date, bucket)
        })
        .await
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        with_retry(&self.retry, "store.purge", || self.purge_before_once(cutoff)).await
    }

    async fn tickers(&self) -> Result<Vec<String>, StoreError> {
        with_retry(&self.retry, "store.tickers", || self.tickers_once()).await
    }
}

#[async_trait]
impl MoverStore for SqliteStore {
    async fn replace_movers(&self, movers: &[Mover]) -> Result<(), StoreError> {
        with_retry(&self.retry, "store.replace_movers", || {
            self.replace_movers_once(movers)
        })
        .await
    }

    async fn movers(&self) -> Result<Vec<Mover>, StoreError> {
        with_retry(&self.retry, "store.movers", || self.movers_once()).await
    }
}

#[async_trait]
impl StatsStore for SqliteStore {
    async fn completion_marker(&self) -> Result<Option<NaiveDate>, StoreError> {
        with_retry(&self.retry, "store.completion_marker", || {
            self.completion_marker_once()
        })
        .await
    }

    async fn commit_daily(&self, stats: &[TickerStat], date: NaiveDate) -> Result<(), StoreError> {
        with_retry(&self.retry, "store.commit_daily", || {
            self.commit_daily_once(stats, date)
        })
        .await
    }

    async fn ticker_stats(&self) -> Result<Vec<TickerStat>, StoreError> {
        with_retry(&self.retry, "store.ticker_stats", || self.ticker_stats_once(None)).await
    }

    async fn ticker_stat(&self, ticker: &str) -> Result<Option<TickerStat>, StoreError> {
        let stats = with_retry(&self.retry, "store.ticker_stat", || {
            self.ticker_stats_once(Some(ticker))
        })
        .await?;
        Ok(stats.into_iter().next())
    }
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(value)
        .map_err(|e| StoreError::Corrupt(format!("{column} = {value:?}: {e}")))
}

fn parse_date(column: &str, value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("{column} = {value:?}: {e}")))
}

fn parse_micros(column: &str, value: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(value)
        .ok_or_else(|| StoreError::Corrupt(format!("{column} = {value} out of range")))
}

fn parse_session(value: &str) -> Result<Session, StoreError> {
    Session::from_str(value).map_err(StoreError::Corrupt)
}

fn sample_from_row(row: &SqliteRow) -> Result<PriceSample, StoreError> {
    let bucket: i64 = row.try_get("bucket")?;

    Ok(PriceSample {
        ticker: row.try_get("ticker")?,
        trading_date: parse_date("trading_date", &row.try_get::<String, _>("trading_date")?)?,
        bucket: u32::try_from(bucket)
            .map_err(|_| StoreError::Corrupt(format!("bucket = {bucket} out of range")))?,
        session: parse_session(&row.try_get::<String, _>("session")?)?,
        price: parse_decimal("price", &row.try_get::<String, _>("price")?)?,
        day_open: parse_decimal("day_open", &row.try_get::<String, _>("day_open")?)?,
        prev_close: parse_decimal("prev_close", &row.try_get::<String, _>("prev_close")?)?,
        timestamp: parse_micros("ts_micros", row.try_get("ts_micros")?)?,
    })
}

fn mover_from_row(row: &SqliteRow) -> Result<Mover, StoreError> {
    let category: String = row.try_get("category")?;

    Ok(Mover {
        category: MoverCategory::from_str(&category).map_err(StoreError::Corrupt)?,
        ticker: row.try_get("ticker")?,
        price: parse_decimal("price", &row.try_get::<String, _>("price")?)?,
        change_pct: parse_decimal("change_pct", &row.try_get::<String, _>("change_pct")?)?,
        session: parse_session(&row.try_get::<String, _>("session")?)?,
        computed_at: parse_micros("computed_at", row.try_get("computed_at")?)?,
    })
}

fn stat_from_row(row: &SqliteRow) -> Result<TickerStat, StoreError> {
    Ok(TickerStat {
        ticker: row.try_get("ticker")?,
        moving_average: parse_decimal("moving_average", &row.try_get::<String, _>("moving_average")?)?,
        swing_average: parse_decimal("swing_average", &row.try_get::<String, _>("swing_average")?)?,
        beta: row.try_get("beta")?,
        as_of: parse_date("as_of", &row.try_get::<String, _>("as_of")?)?,
    })
}
