//! Baseline command implementation

use chrono::NaiveDate;
use clap::Args;

use crate::baseline::BaselineOutcome;
use crate::context::AppContext;
use crate::watchlist::WatchlistSource;

#[derive(Args, Debug)]
pub struct BaselineArgs {
    /// Trading date to run for (defaults to today in exchange time)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl BaselineArgs {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let date = self.date.unwrap_or_else(|| ctx.clock.today());
        let tickers = ctx.watchlist.load_tickers().await?;

        match ctx.baseline_engine().run(date, &tickers).await? {
            BaselineOutcome::AlreadyCompleted => {
                println!("Baseline for {date} already completed");
            }
            BaselineOutcome::Completed(report) => {
                println!(
                    "Baseline for {date}: {} updated, {} skipped",
                    report.updated,
                    report.skipped.len()
                );
            }
            BaselineOutcome::NothingToWrite(report) => {
                println!(
                    "Baseline for {date}: no ticker produced stats ({} skipped), still pending",
                    report.skipped.len()
                );
            }
        }
        Ok(())
    }
}
