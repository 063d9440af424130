//! CLI interface for mtf-trader
//!
//! Provides subcommands for:
//! - `run`: Run the trader over the configured time range
//! - `config`: Show the effective configuration
//! - `levels`: List supported levels

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mtf-trader")]
#[command(about = "Multi-timeframe target selection and trading signal loop")]
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
    /// Run the trader
    Run(RunArgs),
    /// Show configuration
    Config,
    /// List supported levels
    Levels,
}
