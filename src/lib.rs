//! SegmentForge: customer segmentation through RFM analysis and K-Means
//! clustering
//!
//! The library aggregates delivered orders into per-customer
//! Recency/Frequency/Monetary metrics, normalizes them, picks a cluster
//! count with an elbow sweep, clusters with k-means++ seeding, and ranks the
//! resulting clusters into named segments.

pub mod cli;
pub mod data;
pub mod error;
pub mod eval;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod segments;
pub mod selection;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{compute_rfm, normalize, Customer, Order, OrderStatus, RfmRecord};
pub use error::SegmentationError;
pub use model::{fit_kmeans, KMeansConfig, KMeansModel};
pub use pipeline::{segment_customers, SegmentationConfig, SegmentationReport};
pub use segments::{rank_clusters, SegmentPolicy};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
