//! Sample Atlas Report CLI
//!
//! Summarizes a sample dataset by country and, given region geometry,
//! lists the countries that cannot be placed on the map.
//!
//! Usage:
//!   atlas-report --dataset https://example.org/samples.tsv \
//!                --geometry data/custom.geo-midi.json \
//!                --output report.json

use anyhow::Result;
use clap::Parser;
use dataset_fetch::{DatasetClient, DatasetClientConfig, DatasetReport, Source};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "atlas-report",
    about = "Summarize a sample dataset by country"
)]
struct Args {
    /// Dataset TSV file path or http(s) URL
    #[arg(short, long)]
    dataset: String,

    /// Region GeoJSON file path or http(s) URL
    #[arg(short, long)]
    geometry: Option<String>,

    /// Write the full report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of countries to list
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_sec: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = DatasetClient::new(DatasetClientConfig {
        timeout_sec: args.timeout_sec,
        cache_ttl_sec: 0,
    })?;

    let dataset = client.load(&Source::parse(&args.dataset)).await?;
    let geometry = match &args.geometry {
        Some(location) => Some(client.load_geometry(&Source::parse(location)).await?),
        None => None,
    };

    let report = DatasetReport::build(&dataset, geometry.as_ref());

    info!("{}", "=".repeat(60));
    info!("Dataset: {}", report.source);
    info!("{}", "=".repeat(60));
    info!("Total samples: {}", report.total_samples);
    info!("Countries: {}", report.country_count);
    if report.parse_warnings > 0 {
        warn!("{} rows had parse warnings", report.parse_warnings);
    }

    info!("Top {} countries:", args.top);
    for tally in report.top(args.top) {
        info!("  {:>6} | {}", tally.count, tally.country);
    }

    if let Some(unmatched) = &report.unmatched {
        if unmatched.is_empty() {
            info!("All countries matched a map region");
        } else {
            warn!("Unmapped countries: {}", unmatched.join(", "));
        }
    }

    if let Some(path) = &args.output {
        info!("Writing report to {:?}", path);
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &report)?;
    }

    Ok(())
}
