//! Periodic task implementations

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::PeriodicTask;
use crate::baseline::{BaselineEngine, BaselineError, BaselineOutcome, BaselineState};
use crate::ingest::Ingestor;
use crate::momentum::MomentumClassifier;
use crate::session::SessionClock;
use crate::watchlist::WatchlistSource;

/// Snapshot ingestion
pub struct IngestTask {
    ingestor: Arc<Ingestor>,
}

impl IngestTask {
    pub fn new(ingestor: Arc<Ingestor>) -> Self {
        Self { ingestor }
    }
}

#[async_trait]
impl PeriodicTask for IngestTask {
    fn name(&self) -> &'static str {
        "ingest"
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        self.ingestor.run_cycle(Utc::now()).await?;
        Ok(())
    }
}

/// Momentum classification over the current watchlist
pub struct ClassifyTask {
    classifier: Arc<MomentumClassifier>,
    watchlist: Arc<dyn WatchlistSource>,
}

impl ClassifyTask {
    pub fn new(classifier: Arc<MomentumClassifier>, watchlist: Arc<dyn WatchlistSource>) -> Self {
        Self {
            classifier,
            watchlist,
        }
    }
}

#[async_trait]
impl PeriodicTask for ClassifyTask {
    fn name(&self) -> &'static str {
        "classify"
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let tickers = self.watchlist.load_tickers().await?;
        self.classifier.run_cycle(&tickers).await?;
        Ok(())
    }
}

/// Hourly check that runs the baseline once per trading date
pub struct BaselineTask {
    engine: Arc<BaselineEngine>,
    watchlist: Arc<dyn WatchlistSource>,
    clock: SessionClock,
}

impl BaselineTask {
    pub fn new(
        engine: Arc<BaselineEngine>,
        watchlist: Arc<dyn WatchlistSource>,
        clock: SessionClock,
    ) -> Self {
        Self {
            engine,
            watchlist,
            clock,
        }
    }
}

#[async_trait]
impl PeriodicTask for BaselineTask {
    fn name(&self) -> &'static str {
        "baseline"
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let today = self.clock.today();

        if self.engine.status(today).await? != BaselineState::Pending {
            tracing::debug!(date = %today, "Baseline not pending");
            return Ok(());
        }

        let tickers = self.watchlist.load_tickers().await?;
        match self.engine.run(today, &tickers).await {
            Ok(BaselineOutcome::NothingToWrite(report)) => {
                tracing::warn!(skipped = report.skipped.len(), "Baseline produced no stats, will retry");
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(BaselineError::AlreadyRunning) => {
                tracing::debug!("Baseline run already in progress");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
