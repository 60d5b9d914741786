use clap::Parser;
use market_movers::cli::{print_config, print_movers, print_status, Cli, Commands};
use market_movers::config::Config;
use market_movers::context::AppContext;
use market_movers::store::MoverStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {:#}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    let _telemetry = market_movers::telemetry::init_telemetry(&config.telemetry)?;

    if let Commands::Config = cli.command {
        print_config(&config);
        return Ok(());
    }

    let ctx = AppContext::init(config).await?;

    let result = match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting engine");
            args.execute(&ctx).await
        }
        Commands::Ingest => match ctx.ingestor().run_cycle(chrono::Utc::now()).await {
            Ok(summary) => {
                println!(
                    "Ingested {} samples for {} tickers ({} without price, {} purged)",
                    summary.samples, summary.tickers, summary.skipped, summary.purged
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        Commands::Classify(args) => args.execute(&ctx).await,
        Commands::Baseline(args) => args.execute(&ctx).await,
        Commands::Movers => match ctx.store.movers().await {
            Ok(movers) => {
                print_movers(&movers);
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        Commands::Stats(args) => args.execute(&ctx).await,
        Commands::Status => print_status(&ctx).await,
        Commands::Config => Ok(()),
    };

    ctx.shutdown().await;
    result
}
