//! Command-line interface definitions and argument parsing

use crate::model::KMeansConfig;
use crate::pipeline::SegmentationConfig;
use crate::segments::SegmentPolicy;
use chrono::{DateTime, Utc};
use clap::Parser;

/// Customer segmentation CLI: RFM analysis + K-Means clustering
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the customers CSV file
    #[arg(long, default_value = "customers.csv")]
    pub customers: String,

    /// Path to the orders CSV file
    #[arg(long, default_value = "orders.csv")]
    pub orders: String,

    /// Output path for the segmentation report JSON
    #[arg(short, long, default_value = "segments.json")]
    pub report: String,

    /// Output path for the segment scatter plot
    #[arg(short, long, default_value = "segment_plot.png")]
    pub plot: String,

    /// Fix the cluster count instead of running the elbow sweep
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,

    /// Maximum iterations for K-Means convergence
    #[arg(long, default_value = "100")]
    pub max_iters: usize,

    /// Tolerance for K-Means convergence
    #[arg(long, default_value = "1e-4")]
    pub tolerance: f64,

    /// Seed for reproducible clustering runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reference date for recency (RFC 3339); defaults to the current time
    #[arg(long)]
    pub reference_date: Option<String>,

    /// Re-run even if the stored report is still fresh
    #[arg(long)]
    pub force: bool,

    /// Skip chart generation
    #[arg(long)]
    pub no_plots: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Reference instant for recency computation.
    pub fn reference_instant(&self) -> crate::Result<DateTime<Utc>> {
        match &self.reference_date {
            Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc)),
            None => Ok(Utc::now()),
        }
    }

    /// Assemble the pipeline configuration from the parsed arguments.
    pub fn segmentation_config(&self) -> SegmentationConfig {
        SegmentationConfig {
            kmeans: KMeansConfig {
                max_iterations: self.max_iters,
                tolerance: self.tolerance,
            },
            policy: SegmentPolicy::default(),
            fixed_k: self.clusters,
            seed: self.seed,
        }
    }
}
