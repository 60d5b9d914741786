//! Classify command implementation

use clap::Args;

use super::print_movers;
use crate::context::AppContext;
use crate::store::MoverStore;
use crate::watchlist::WatchlistSource;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Print the resulting movers
    #[arg(long)]
    pub print: bool,
}

impl ClassifyArgs {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let tickers = ctx.watchlist.load_tickers().await?;
        let summary = ctx.classifier().run_cycle(&tickers).await?;

        println!(
            "Classified {} tickers, {} movers",
            summary.tickers, summary.movers
        );
        if self.print {
            print_movers(&ctx.store.movers().await?);
        }
        Ok(())
    }
}
