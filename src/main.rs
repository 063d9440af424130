use chrono::{DateTime, Utc};
use clap::Parser;
use mtf_trader::cli::{Cli, Commands};
use mtf_trader::config::Config;
use mtf_trader::level::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    let _telemetry = mtf_trader::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting trader");
            args.execute(&config).await?;
        }
        Commands::Config => {
            let trader = &config.trader;
            println!("Current configuration:");
            println!("  Trader: {} at {}", trader.name, trader.level);
            let start = or_dash(trader.start);
            let end = or_dash(trader.end);
            println!("  Range: {} .. {}", start, end);
            println!(
                "  Universe: {} on {:?}",
                trader.universe.instrument_type, trader.universe.exchanges
            );
            println!("  Real time: {}", trader.real_time);
            println!("  Undecided levels: {:?}", trader.undecided_level);
            println!("  Comparator limit: {}", config.comparator.limit);
            println!("  Initial cash: {}", config.account.initial_cash);
            for selector in &config.selectors {
                println!(
                    "  Selector {} ({}): {} targets",
                    selector.name,
                    selector.level,
                    selector.targets.len()
                );
            }
        }
        Commands::Levels => {
            for level in Level::ALL {
                println!("{:>4}  {}s", level, level.duration_seconds());
            }
        }
    }

    Ok(())
}

fn or_dash(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(|| "-".to_string(), |t| t.to_string())
}
