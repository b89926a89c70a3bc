//! The `grayline run` command.

use clap::Args;
use grayline_core::{Config, Pipeline, RunSummary};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Image identifiers (URLs) to process, in order
    pub identifiers: Vec<String>,

    /// File with one identifier per line ("-" reads stdin)
    #[arg(short, long)]
    pub input_file: Option<PathBuf>,

    /// Directory for decoded originals (overrides config)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Directory for grayscale results (overrides config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Images the fetch stage may buffer ahead of conversion (overrides config)
    #[arg(long)]
    pub fetch_buffer: Option<usize>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);
    config.validate()?;

    let mut identifiers = args.identifiers.clone();
    if let Some(path) = &args.input_file {
        identifiers.extend(read_identifiers(path)?);
    }
    if identifiers.is_empty() {
        tracing::warn!("No identifiers given; nothing to do");
        return Ok(());
    }
    tracing::info!("Processing {} image(s)", identifiers.len());

    let pipeline = Pipeline::from_config(&config)?;
    let report = pipeline.run(identifiers).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        print_summary(&report.summary, &config);
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(dir) = &args.input_dir {
        config.storage.input_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.storage.output_dir = dir.clone();
    }
    if let Some(n) = args.fetch_buffer {
        config.pipeline.fetch_buffer = n;
    }
}

fn read_identifiers(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?
    };
    Ok(parse_identifiers(&content))
}

/// One identifier per line; blank lines and `#` comments are ignored.
fn parse_identifiers(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn print_summary(summary: &RunSummary, config: &Config) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Processed:    {:>8}", summary.processed);
    if summary.fetch_failures > 0 {
        eprintln!("    Fetch failed: {:>8}", summary.fetch_failures);
    }
    if summary.decode_failures > 0 {
        eprintln!("    Undecodable:  {:>8}", summary.decode_failures);
    }
    let unsaved = summary.input_persist_failures + summary.output_persist_failures;
    if unsaved > 0 {
        eprintln!("    Not saved:    {:>8}", unsaved);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Submitted:    {:>8}", summary.submitted);
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed_seconds);
    eprintln!("    Rate:         {:>7.1} img/sec", summary.images_per_second());
    eprintln!("    Output:       {}", config.output_dir().display());
    eprintln!("  ====================================");
}
