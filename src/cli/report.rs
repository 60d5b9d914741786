//! Read-only reporting commands

use clap::Args;

use crate::baseline::TickerStat;
use crate::config::Config;
use crate::context::AppContext;
use crate::momentum::Mover;
use crate::store::{MoverStore, PriceHistory, StatsStore};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Only this ticker
    pub ticker: Option<String>,
}

impl StatsArgs {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let stats = match &self.ticker {
            Some(ticker) => ctx
                .store
                .ticker_stat(&ticker.trim().to_uppercase())
                .await?
                .into_iter()
                .collect(),
            None => ctx.store.ticker_stats().await?,
        };
        print_stats(&stats);
        Ok(())
    }
}

pub fn print_movers(movers: &[Mover]) {
    if movers.is_empty() {
        println!("No movers");
        return;
    }
    println!(
        "{:<14} {:<8} {:>12} {:>9} {:<12}",
        "CATEGORY", "TICKER", "PRICE", "CHANGE%", "SESSION"
    );
    for mover in movers {
        println!(
            "{:<14} {:<8} {:>12} {:>9} {:<12}",
            mover.category.to_string(),
            mover.ticker,
            mover.price.to_string(),
            mover.change_pct.round_dp(2).to_string(),
            mover.session.as_str()
        );
    }
}

pub fn print_stats(stats: &[TickerStat]) {
    if stats.is_empty() {
        println!("No baseline statistics");
        return;
    }
    println!(
        "{:<8} {:>12} {:>10} {:>7} {:<10}",
        "TICKER", "MA", "SWING", "BETA", "AS OF"
    );
    for stat in stats {
        println!(
            "{:<8} {:>12} {:>10} {:>7.2} {:<10}",
            stat.ticker,
            stat.moving_average.round_dp(2).to_string(),
            stat.swing_average.round_dp(2).to_string(),
            stat.beta,
            stat.as_of.to_string()
        );
    }
}

pub async fn print_status(ctx: &AppContext) -> anyhow::Result<()> {
    let today = ctx.clock.today();
    let marker = ctx.store.completion_marker().await?;
    let tickers = ctx.store.tickers().await?;
    let movers = ctx.store.movers().await?;

    println!("market-movers status");
    println!("  Session: {} ({})", ctx.clock.current_session(), ctx.clock.timezone());
    println!("  Exchange time: {}", ctx.clock.now_local().format("%Y-%m-%d %H:%M:%S"));
    println!("  Trading date: {today}");
    match marker {
        Some(date) if date == today => println!("  Baseline: completed"),
        Some(date) => println!("  Baseline: pending (last run {date})"),
        None => println!("  Baseline: pending (never run)"),
    }
    println!("  Tickers with history: {}", tickers.len());
    println!("  Current movers: {}", movers.len());
    Ok(())
}

pub fn print_config(config: &Config) {
    println!("Current configuration:");
    println!(
        "  Store: {} (retention {}h)",
        config.store.database_url, config.store.retention_hours
    );
    println!(
        "  Provider: {} (key {})",
        config.provider.base_url,
        if config.provider.resolve_api_key().is_some() { "set" } else { "missing" }
    );
    println!(
        "  Watchlist: {} [{}]",
        config.watchlist.path.display(),
        config.watchlist.column
    );
    println!("  Session: {}", config.session.timezone);
    for horizon in &config.momentum.horizons {
        let lookback = match horizon.offset_buckets {
            Some(n) => format!("{n} buckets"),
            None => "previous close".to_string(),
        };
        println!(
            "  Horizon {}: {} (+{}% / -{}%)",
            horizon.label, lookback, horizon.ripper_pct, horizon.dipper_pct
        );
    }
    println!(
        "  Baseline: {} over {} bars, {} day lookback",
        config.baseline.benchmark, config.baseline.window, config.baseline.lookback_days
    );
    println!(
        "  Schedule: ingest {}s, classify {}s, baseline {}s",
        config.schedule.ingest_interval_secs,
        config.schedule.classify_interval_secs,
        config.schedule.baseline_interval_secs
    );
}
