//! bmex CLI: download BitMEX trade and quote archives and split them into
//! per-symbol, per-day CSV files.
//!
//! ```text
//! bmex --symbols XBTUSD ETHUSD --channels trades quotes \
//!      --start 2018-10-30 --end 2018-11-01 [--output DIR] [--config FILE] [--report FILE]
//! ```
//!
//! Exit code 0 when the run completes, including channels that stopped at a
//! day not yet published; 1 on invalid input or a fatal download error.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};

use bmex_core::data::BitmexClient;
use bmex_core::domain::{Channel, SymbolSet};
use bmex_runner::{HarvestConfig, HarvestRequest, Harvester, RunReport, StdoutProgress};

#[derive(Parser)]
#[command(
    name = "bmex",
    version,
    about = "Download BitMEX trade and quote archives and partition them by symbol and day"
)]
struct Cli {
    /// Instrument symbols to keep (e.g., XBTUSD ETHUSD).
    #[arg(long, num_args = 1.., required = true)]
    symbols: Vec<String>,

    /// Channels to download: trades, quotes.
    #[arg(long, value_parser = parse_channel, num_args = 1.., required = true)]
    channels: Vec<Channel>,

    /// First day to download (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,

    /// Last day to download (YYYY-MM-DD). Days after today are skipped.
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,

    /// Output directory. Overrides `output_root` from the config file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the run report as JSON to this file.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn parse_channel(s: &str) -> Result<Channel, String> {
    s.parse::<Channel>().map_err(|e| e.to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("'{s}' is not a YYYY-MM-DD date: {e}"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.output)?;

    let client = BitmexClient::new(&config.base_url, &config.catalog_url, config.http_timeout())
        .context("failed to build HTTP client")?;
    let progress = StdoutProgress::stdout();
    let harvester = Harvester::new(&client, &client, &progress, config);

    let symbols = SymbolSet::new(&cli.symbols)?;
    let request = HarvestRequest::new(cli.start, cli.end, symbols, cli.channels);

    let report = harvester.run(&request)?;
    tracing::info!(
        complete = report.is_complete(),
        rows = report.total_rows(),
        "run complete"
    );

    if let Some(path) = cli.report {
        write_report(&report, &path)?;
    }
    Ok(())
}

fn load_config(path: Option<&Path>, output: Option<PathBuf>) -> Result<HarvestConfig> {
    let mut config = match path {
        Some(path) => HarvestConfig::from_file(path)?,
        None => HarvestConfig::default(),
    };
    if let Some(output) = output {
        config.output_root = output;
    }
    if let Some(scratch) = &config.scratch_dir {
        std::fs::create_dir_all(scratch)
            .with_context(|| format!("failed to create scratch dir {}", scratch.display()))?;
    }
    Ok(config)
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = report.to_json()?;
    std::fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))?;
    println!("Report: {}", path.display());
    Ok(())
}
