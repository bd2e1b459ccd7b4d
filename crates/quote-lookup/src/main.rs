//! Quote lookup CLI.
//!
//! # Usage
//!
//! ```bash
//! # Equities and crypto in one call
//! quote price AAPL BTC.CRYPTO
//!
//! # Drop expired cache entries
//! quote sweep
//!
//! # Delete the cache file
//! quote clear
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use quote_lookup::{QuoteCache, QuoteConfig, Symbol, logging};

#[derive(Debug, Parser)]
#[command(name = "quote")]
#[command(about = "Look up stock and crypto prices", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: QuoteConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the current price of each symbol
    Price {
        /// Symbols to look up (crypto as `BTC.CRYPTO`)
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Remove expired entries from the cache file
    Sweep,

    /// Delete the cache file
    Clear,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(&cli.config.log_level).context("failed to initialize logging")?;

    match cli.command {
        Commands::Price { symbols } => {
            let service = cli
                .config
                .build_service()
                .context("invalid quote configuration")?;

            let symbols: Vec<Symbol> = symbols.into_iter().map(Symbol::from).collect();
            let mut missing = false;
            for (symbol, price) in service.get_prices(&symbols).await {
                match price {
                    Some(price) => println!("{symbol}\t{price}"),
                    None => {
                        missing = true;
                        println!("{symbol}\t-");
                    }
                }
            }

            Ok(if missing {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Sweep => {
            let Some(cache) = cli.config.file_cache() else {
                bail!("no cache configured, set QUOTE_CACHE_PATH or --cache-path");
            };
            let removed = cache.sweep_expired().await.context("failed to sweep cache")?;
            println!("{removed}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Clear => {
            let Some(cache) = cli.config.file_cache() else {
                bail!("no cache configured, set QUOTE_CACHE_PATH or --cache-path");
            };
            cache.clear().await.context("failed to clear cache")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
