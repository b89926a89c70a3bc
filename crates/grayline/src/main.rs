//! Grayline CLI - fetch remote images, convert them to grayscale, keep both.
//!
//! Originals land in the input directory, grayscale copies in the output
//! directory, one PNG per identifier.
//!
//! # Usage
//!
//! ```bash
//! # Process a few URLs
//! grayline run https://example.com/a.jpg https://example.com/b.png
//!
//! # Process a list of URLs, one per line
//! grayline run --input-file urls.txt --json
//!
//! # View configuration
//! grayline config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Grayline - fetch remote images, convert them to grayscale, keep both.
#[derive(Parser, Debug)]
#[command(name = "grayline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "GRAYLINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch images, convert them to grayscale, and store both versions
    Run(cli::run::RunArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let loaded = match &cli.config {
        Some(path) => grayline_core::Config::load_from(path),
        None => grayline_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `grayline config path`."
            );
            grayline_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Grayline v{}", grayline_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}
