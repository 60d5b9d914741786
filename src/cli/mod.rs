//! CLI interface for market-movers
//!
//! Provides subcommands for:
//! - `run`: Start the ingestion, classification and baseline tasks
//! - `ingest`: One ingestion cycle
//! - `classify`: One momentum cycle
//! - `baseline`: One baseline run
//! - `movers` / `stats` / `status`: Read the store
//! - `config`: Show configuration

mod baseline;
mod classify;
mod report;
mod run;

pub use baseline::BaselineArgs;
pub use classify::ClassifyArgs;
pub use report::{print_config, print_movers, print_stats, print_status, StatsArgs};
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "market-movers")]
#[command(about = "Intraday momentum movers and daily baseline statistics for a stock watchlist")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start all periodic tasks until Ctrl-C
    Run(RunArgs),
    /// Ingest one round of snapshots
    Ingest,
    /// Run one momentum classification cycle
    Classify(ClassifyArgs),
    /// Run the daily baseline statistics
    Baseline(BaselineArgs),
    /// Print the current movers
    Movers,
    /// Print baseline statistics
    Stats(StatsArgs),
    /// Show session and store state
    Status,
    /// Show configuration
    Config,
}
