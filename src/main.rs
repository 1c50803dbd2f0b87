//! ShopForge: transaction trend and RFM segmentation report
//!
//! Loads the dataset once, runs both analyses, then prints the report and
//! renders the charts.

use anyhow::{Context, Result};
use clap::Parser;
use shopforge::{build_report, viz, Args, Dataset};
use std::time::Instant;

fn main() -> Result<()> {
    // Step 1: configuration and logging
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    let options = args.report_options()?;
    let start_time = Instant::now();

    // Step 2: load and validate the dataset
    let data_start = Instant::now();
    let dataset = Dataset::load(&args.input)
        .with_context(|| format!("Failed to load dataset from {}", args.input))?;
    tracing::debug!(
        rows = dataset.len(),
        elapsed_ms = data_start.elapsed().as_millis() as u64,
        "dataset ready"
    );

    // Step 3: trend and segmentation
    let report = build_report(&dataset, &options)?;

    // Step 4: console or JSON output
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("=== E-Commerce Performance Report ===");
        println!("Input: {} ({} rows)", args.input, dataset.len());
        viz::print_trend_summary(&report);
        viz::print_segmentation(&report);
    }

    // Step 5: charts
    if !args.no_charts {
        let written = viz::generate_visualization_report(&report, |suffix| args.chart_path(suffix))?;
        if !args.json {
            for path in &written {
                println!("Chart saved to: {path}");
            }
        }
    }

    tracing::info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "report complete"
    );

    Ok(())
}

/// Logs go to stderr so `--json` output stays clean on stdout
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_level = if verbose { "shopforge=debug" } else { "shopforge=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
