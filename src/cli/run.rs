//! Run command implementation

use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use crate::context::AppContext;
use crate::scheduler::{run_periodic, BaselineTask, ClassifyTask, IngestTask, PeriodicTask, Shutdown};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Do not start the daily baseline task
    #[arg(long)]
    pub skip_baseline: bool,
}

impl RunArgs {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let schedule = &ctx.config.schedule;

        let ingest: Arc<dyn PeriodicTask> = Arc::new(IngestTask::new(Arc::new(ctx.ingestor())));
        let classify: Arc<dyn PeriodicTask> = Arc::new(ClassifyTask::new(
            Arc::new(ctx.classifier()),
            ctx.watchlist.clone(),
        ));

        let mut tasks = vec![
            (ingest, schedule.ingest_interval_secs),
            (classify, schedule.classify_interval_secs),
        ];
        if !self.skip_baseline {
            let baseline: Arc<dyn PeriodicTask> = Arc::new(BaselineTask::new(
                Arc::new(ctx.baseline_engine()),
                ctx.watchlist.clone(),
                ctx.clock.clone(),
            ));
            tasks.push((baseline, schedule.baseline_interval_secs));
        }

        let shutdown = Shutdown::new();
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|(task, secs)| {
                tokio::spawn(run_periodic(
                    task,
                    Duration::from_secs(secs.max(1)),
                    shutdown.subscribe(),
                ))
            })
            .collect();

        tracing::info!(tasks = handles.len(), "Engine started, press Ctrl-C to stop");

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown requested, waiting for in-flight cycles");
        shutdown.trigger();

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Task panicked");
            }
        }

        Ok(())
    }
}
