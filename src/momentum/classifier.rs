//! Momentum classifier
//!
//! Each cycle compares every ticker's latest sample against the price a fixed
//! number of buckets earlier (and against the previous close) and flags the
//! tickers whose percent change crosses a horizon's threshold. The emitted
//! set replaces the previous one wholesale.

use chrono::{DateTime, NaiveDate, Utc};
use futures_util::{stream, StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use super::types::{Direction, Horizon, Lookback, Mover, MoverCategory};
use crate::config::MomentumConfig;
use crate::session::{Session, SessionClock};
use crate::store::{MoverStore, PriceHistory, Store, StoreError};
use crate::telemetry::{record_latency, set_gauge, GaugeMetric, LatencyMetric};

/// Percent change from `old` to `new` (1.5 = +1.5%)
///
/// Zero when `old` is absent or zero; never fails.
pub fn percent_change(old: Option<Decimal>, new: Decimal) -> Decimal {
    let Some(old) = old.filter(|o| !o.is_zero()) else {
        return Decimal::ZERO;
    };

    new.checked_sub(old)
        .and_then(|diff| diff.checked_div(old))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Price of the sample at or before `bucket - offset` on the same trading date
///
/// Offsets reaching before local midnight have no sample.
pub async fn price_at_offset<S: PriceHistory + ?Sized>(
    store: &S,
    ticker: &str,
    trading_date: NaiveDate,
    bucket: u32,
    offset: u32,
) -> Result<Option<Decimal>, StoreError> {
    let Some(target) = bucket.checked_sub(offset) else {
        return Ok(None);
    };

    Ok(store
        .at_or_before(ticker, trading_date, target)
        .await?
        .map(|sample| sample.price))
}

/// Evaluate every horizon for one ticker
///
/// A ticker with no samples, or a horizon with no reference sample,
/// contributes nothing.
pub async fn classify_ticker<S: PriceHistory + ?Sized>(
    store: &S,
    ticker: &str,
    horizons: &[Horizon],
    session: Session,
    computed_at: DateTime<Utc>,
) -> Result<Vec<Mover>, StoreError> {
    let Some(current) = store.latest(ticker).await? else {
        tracing::debug!(ticker, "No samples, skipping");
        return Ok(Vec::new());
    };

    let mut movers = Vec::new();

    for horizon in horizons {
        let reference = match horizon.lookback {
            Lookback::Buckets(offset) => {
                let past = price_at_offset(
                    store,
                    ticker,
                    current.trading_date,
                    current.bucket,
                    offset,
                )
                .await?;

                match past {
                    Some(price) => price,
                    None => {
                        tracing::trace!(ticker, horizon = %horizon.label, "No lookback sample");
                        continue;
                    }
                }
            }
            Lookback::PreviousClose => current.prev_close,
        };

        let change_pct = percent_change(Some(reference), current.price);

        let mut emit = |direction: Direction| {
            movers.push(Mover {
                category: horizon.category(direction),
                ticker: ticker.to_string(),
                price: current.price,
                change_pct,
                session,
                computed_at,
            });
        };

        if horizon.is_ripper(change_pct) {
            emit(Direction::Ripper);
        }
        if horizon.is_dipper(change_pct) {
            emit(Direction::Dipper);
        }
    }

    Ok(movers)
}

/// Result of one classifier cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Distinct tickers evaluated
    pub tickers: usize,
    /// Movers written
    pub movers: usize,
}

/// Periodic momentum classifier over the shared store
pub struct MomentumClassifier {
    store: Arc<dyn Store>,
    horizons: Vec<Horizon>,
    clock: SessionClock,
    max_concurrency: usize,
}

impl MomentumClassifier {
    /// Create a classifier over the given horizons
    pub fn new(store: Arc<dyn Store>, horizons: Vec<Horizon>, clock: SessionClock) -> Self {
        Self {
            store,
            horizons,
            clock,
            max_concurrency: 16,
        }
    }

    /// Create from application config
    pub fn from_config(store: Arc<dyn Store>, config: &MomentumConfig, clock: SessionClock) -> Self {
        let horizons = config.horizons.iter().map(Horizon::from).collect();
        Self::new(store, horizons, clock).with_concurrency(config.max_concurrency)
    }

    /// Bound on tickers evaluated at once
    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Configured horizons
    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    /// Classify all tickers as of now
    pub async fn classify_cycle(&self, tickers: &[String]) -> Result<Vec<Mover>, StoreError> {
        self.classify_at(tickers, Utc::now()).await
    }

    /// Classify all tickers, stamping movers with `now`
    ///
    /// Missing history only drops that ticker or horizon; a store failure
    /// fails the whole cycle. The result holds at most one mover per
    /// `(category, ticker)`, ordered by category then ticker.
    pub async fn classify_at(
        &self,
        tickers: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<Mover>, StoreError> {
        let session = self.clock.session_at(now);
        let unique: BTreeSet<String> = tickers.iter().cloned().collect();

        let per_ticker: Vec<Vec<Mover>> = stream::iter(unique)
            .map(|ticker| async move {
                classify_ticker(self.store.as_ref(), &ticker, &self.horizons, session, now)
                    .await
                    .map_err(|e| {
                        tracing::warn!(ticker = %ticker, error = %e, "Classification failed for ticker");
                        e
                    })
            })
            .buffer_unordered(self.max_concurrency)
            .try_collect()
            .await?;

        let mut set: BTreeMap<(MoverCategory, String), Mover> = BTreeMap::new();
        for mover in per_ticker.into_iter().flatten() {
            set.insert(mover.key(), mover);
        }

        Ok(set.into_values().collect())
    }

    /// Classify and replace the stored mover set
    ///
    /// An empty ticker list is a no-op: nothing is written and the previous
    /// set stays in place. So does a cycle that hit a store error.
    pub async fn run_cycle(&self, tickers: &[String]) -> Result<CycleSummary, StoreError> {
        if tickers.is_empty() {
            tracing::info!("Empty watchlist, skipping classification");
            return Ok(CycleSummary::default());
        }

        let started = Instant::now();
        let movers = self.classify_cycle(tickers).await?;
        self.store.replace_movers(&movers).await?;

        let summary = CycleSummary {
            tickers: tickers.iter().collect::<BTreeSet<_>>().len(),
            movers: movers.len(),
        };

        record_latency(LatencyMetric::ClassifyCycle, started.elapsed());
        set_gauge(GaugeMetric::Movers, summary.movers as f64);
        tracing::info!(
            tickers = summary.tickers,
            movers = summary.movers,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Momentum cycle complete"
        );

        Ok(summary)
    }
}
