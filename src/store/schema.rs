//! SQLite schema
//!
//! Created on connect; every statement is idempotent. Decimals are stored
//! as TEXT to keep full precision, timestamps as microseconds since epoch.

use sqlx::SqlitePool;

use super::StoreError;

/// Key of the daily completion marker in `system_status`
pub const BASELINE_MARKER_KEY: &str = "last_baseline_run";

/// Create tables and indexes if they do not exist
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS price_samples (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  ticker TEXT NOT NULL,
  trading_date TEXT NOT NULL,
  bucket INTEGER NOT NULL,
  session TEXT NOT NULL,
  price TEXT NOT NULL,
  day_open TEXT NOT NULL,
  prev_close TEXT NOT NULL,
  ts_micros INTEGER NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_samples_lookup ON price_samples(ticker, trading_date, bucket, ts_micros)",
        "CREATE INDEX IF NOT EXISTS idx_samples_latest ON price_samples(ticker, ts_micros)",
        "CREATE INDEX IF NOT EXISTS idx_samples_ts ON price_samples(ts_micros)",
    ];
    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS movers (
  category TEXT NOT NULL,
  ticker TEXT NOT NULL,
  price TEXT NOT NULL,
  change_pct TEXT NOT NULL,
  session TEXT NOT NULL,
  computed_at INTEGER NOT NULL,
  PRIMARY KEY (category, ticker)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS ticker_stats (
  ticker TEXT PRIMARY KEY,
  moving_average TEXT NOT NULL,
  swing_average TEXT NOT NULL,
  beta REAL NOT NULL,
  as_of TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS system_status (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Store schema ready");
    Ok(())
}
