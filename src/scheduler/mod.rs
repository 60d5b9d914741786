//! Periodic task runner
//!
//! Every long-running loop is a [`PeriodicTask`] driven by [`run_periodic`]:
//! one invocation per tick, errors logged and counted, shutdown checked
//! between invocations.

mod tasks;

pub use tasks::{BaselineTask, ClassifyTask, IngestTask};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

use crate::telemetry::{increment_counter, CounterMetric};

/// A unit of periodic work
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Name used in logs and spans
    fn name(&self) -> &'static str;

    /// One invocation; errors are logged and the next tick proceeds
    async fn run_once(&self) -> anyhow::Result<()>;
}

/// Process-wide shutdown signal
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Ask every subscribed loop to stop after its current invocation
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Drive `task` every `every` until shutdown
///
/// The first invocation runs immediately. Ticks missed while an invocation
/// overruns are skipped rather than replayed.
pub async fn run_periodic(
    task: Arc<dyn PeriodicTask>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let name = task.name();
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(task = name, every_ms = every.as_millis() as u64, "Periodic task started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", task = name, %cycle_id);

        if let Err(e) = task.run_once().instrument(span).await {
            tracing::error!(task = name, %cycle_id, error = %format!("{e:#}"), "Task invocation failed");
            increment_counter(CounterMetric::TaskFailures, 1);
        }
    }

    tracing::info!(task = name, "Periodic task stopped");
}
