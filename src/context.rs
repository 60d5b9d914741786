//! Process-wide application context
//!
//! Built once at startup and shared by every command and task.

use anyhow::Context as _;
use std::sync::Arc;

use crate::baseline::BaselineEngine;
use crate::config::Config;
use crate::ingest::Ingestor;
use crate::momentum::MomentumClassifier;
use crate::provider::{MarketDataProvider, PolygonClient, PolygonConfig};
use crate::retry::RetryPolicy;
use crate::session::SessionClock;
use crate::store::{SqliteStore, Store};
use crate::watchlist::{CsvWatchlist, WatchlistSource};

/// Shared handles for one process
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub provider: Arc<dyn MarketDataProvider>,
    pub watchlist: Arc<dyn WatchlistSource>,
    pub clock: SessionClock,
    sqlite: Option<Arc<SqliteStore>>,
}

impl AppContext {
    /// Connect the store and build the provider, watchlist and clock
    pub async fn init(config: Config) -> anyhow::Result<Self> {
        let retry = RetryPolicy::from(&config.retry);
        let clock = SessionClock::from_config(&config.session)?;

        let sqlite = Arc::new(
            SqliteStore::connect(&config.store, retry.clone())
                .await
                .with_context(|| format!("opening store {}", config.store.database_url))?,
        );

        let polygon = PolygonClient::new(PolygonConfig::from(&config.provider), retry)?;
        if !polygon.has_api_key() {
            tracing::warn!("No Polygon API key configured; provider requests will fail");
        }

        let watchlist = CsvWatchlist::from_config(&config.watchlist);

        Ok(Self {
            store: sqlite.clone(),
            provider: Arc::new(polygon),
            watchlist: Arc::new(watchlist),
            clock,
            sqlite: Some(sqlite),
            config,
        })
    }

    /// Assemble a context from existing parts
    pub fn from_parts(
        config: Config,
        store: Arc<dyn Store>,
        provider: Arc<dyn MarketDataProvider>,
        watchlist: Arc<dyn WatchlistSource>,
        clock: SessionClock,
    ) -> Self {
        Self {
            config,
            store,
            provider,
            watchlist,
            clock,
            sqlite: None,
        }
    }

    pub fn classifier(&self) -> MomentumClassifier {
        MomentumClassifier::from_config(self.store.clone(), &self.config.momentum, self.clock.clone())
    }

    pub fn baseline_engine(&self) -> BaselineEngine {
        BaselineEngine::new(
            self.store.clone(),
            self.provider.clone(),
            self.config.baseline.clone(),
        )
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(
            self.store.clone(),
            self.provider.clone(),
            self.watchlist.clone(),
            self.clock.clone(),
            self.config.store.retention(),
        )
    }

    /// Release the database pool
    pub async fn shutdown(&self) {
        if let Some(sqlite) = &self.sqlite {
            sqlite.close().await;
        }
    }
}
