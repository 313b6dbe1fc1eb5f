//! SegmentForge: customer segmentation CLI
//!
//! Entrypoint that loads the customer and order collections, runs the
//! segmentation pipeline, and persists the report (full overwrite) plus
//! optional charts.

use anyhow::{Context, Result};
use clap::Parser;
use segmentforge::{
    compute_rfm, ingest, normalize, segment_customers, viz, Args, SegmentationError,
    SegmentationReport,
};
use std::time::{Duration, Instant, SystemTime};
use tracing_subscriber::EnvFilter;

/// How long a stored report stays fresh before a re-run is due.
const RERUN_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.verbose {
        println!("SegmentForge - Customer Segmentation using RFM + K-Means");
        println!("========================================================\n");
    }

    if !args.force && report_is_fresh(&args.report) {
        println!(
            "Stored report {} is younger than {} days; use --force to re-run.",
            args.report,
            RERUN_INTERVAL.as_secs() / 86_400
        );
        return Ok(());
    }

    let start_time = Instant::now();

    // Step 1: fetch both collections once, before the pipeline starts.
    if args.verbose {
        println!("Step 1: Loading data");
        println!("  Customers file: {}", args.customers);
        println!("  Orders file: {}", args.orders);
    }
    let load_start = Instant::now();
    let customers = ingest::load_customers(&args.customers)?;
    let orders = ingest::load_orders(&args.orders)?;
    let load_time = load_start.elapsed();

    println!(
        "✓ Loaded {} customers and {} delivered orders",
        customers.len(),
        orders.len()
    );
    if args.verbose {
        println!("  Loading time: {:.2}s", load_time.as_secs_f64());
    }

    // Step 2: run the pipeline.
    let now = args.reference_instant()?;
    let config = args.segmentation_config();

    let model_start = Instant::now();
    let report = match segment_customers(&customers, &orders, now, &config) {
        Ok(report) => report,
        Err(SegmentationError::EmptyPopulation) => {
            println!("No customers with delivered orders; stored report left untouched.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let model_time = model_start.elapsed();

    println!("✓ Segmentation complete");
    if args.verbose {
        println!("  Clustering time: {:.2}s", model_time.as_secs_f64());
    }

    print_report(&report);

    // Step 3: persist the report, replacing any previous run wholesale.
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&args.report, json)
        .with_context(|| format!("failed to write report to {}", args.report))?;
    println!("\nReport saved to: {}", args.report);

    // Step 4: charts.
    if !args.no_plots {
        let features = normalize(&compute_rfm(&customers, &orders, now));
        viz::render_report_charts(&features, &report, &args.plot)?;
        println!("Segment plot saved to: {}", args.plot);
        println!(
            "Segment sizes saved to: {}",
            args.plot.replace(".png", "_sizes.png")
        );
    }

    let total_time = start_time.elapsed();
    println!("\nTotal processing time: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

/// Whether the stored report is younger than the re-run interval.
fn report_is_fresh(path: &str) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age < RERUN_INTERVAL)
        .unwrap_or(true)
}

fn print_report(report: &SegmentationReport) {
    println!("\n=== Segmentation Report ===");
    println!("Customers segmented: {}", report.population.customers);
    println!("Optimal K: {}", report.optimal_k);
    println!("Iterations: {}", report.iterations);
    println!("Silhouette score: {:.3}", report.silhouette_score);
    println!("Within-cluster sum of squares: {:.4}", report.inertia);

    let axis_names = ["recency", "frequency", "monetary"];
    for (axis, &degenerate) in report.degenerate_axes.iter().enumerate() {
        if degenerate {
            println!(
                "Warning: {} has zero variance across the population",
                axis_names[axis]
            );
        }
    }

    println!("\n  Rank | Segment       |  Size | Avg Recency | Avg Freq | Avg Monetary");
    println!("  -----|---------------|-------|-------------|----------|-------------");
    for cluster in &report.clusters {
        println!(
            "  {:4} | {:13} | {:5} | {:11.1} | {:8.1} | {:12.2}",
            cluster.rank,
            cluster.label,
            cluster.size,
            cluster.avg_recency,
            cluster.avg_frequency,
            cluster.avg_monetary
        );
    }
}
