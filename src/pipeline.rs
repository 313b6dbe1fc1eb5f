//! End-to-end segmentation pipeline: aggregate, normalize, cluster, rank

use crate::data::{compute_rfm, normalize, Customer, Order, PopulationStats, RfmRecord};
use crate::error::SegmentationError;
use crate::eval::silhouette_score;
use crate::model::{fit_kmeans, KMeansConfig, KMeansModel};
use crate::segments::{cluster_stats, rank_clusters, RankedCluster, SegmentPolicy};
use crate::selection::select_optimal_k;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Full configuration for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct SegmentationConfig {
    pub kmeans: KMeansConfig,
    pub policy: SegmentPolicy,
    /// Skip the elbow sweep and cluster with exactly this K.
    pub fixed_k: Option<usize>,
    /// Seed for reproducible runs; unseeded runs draw from entropy.
    pub seed: Option<u64>,
}

/// One customer's segment membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSegment {
    pub customer_id: String,
    pub cluster_id: usize,
    pub label: String,
}

/// The complete result of an analysis run.
///
/// Rebuilt wholesale every run; callers persist it by replacing any prior
/// stored report in full rather than merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationReport {
    /// Reference instant the run was computed against.
    pub generated_at: DateTime<Utc>,
    /// Cluster count actually used, from the elbow sweep or the fallback.
    pub optimal_k: usize,
    /// Segment membership per customer, in aggregation order.
    pub assignments: Vec<CustomerSegment>,
    /// Clusters sorted by rank, best first.
    pub clusters: Vec<RankedCluster>,
    pub silhouette_score: f64,
    /// Final-run WCSS in normalized space.
    pub inertia: f64,
    /// Lloyd iterations of the final run.
    pub iterations: usize,
    /// Descriptive statistics of the segmented population.
    pub population: PopulationStats,
    /// Zero-variance axes in R/F/M order; a flagged axis contributed nothing
    /// to cluster distances this run.
    pub degenerate_axes: [bool; 3],
}

/// Run the full segmentation pipeline over in-memory customers and orders.
///
/// `now` anchors recency; pass the wall clock or a fixed reference date.
/// Returns [`SegmentationError::EmptyPopulation`] when no customer has a
/// delivered order. Populations too small for the elbow sweep fall back to
/// the policy's default K, capped by the population size.
pub fn segment_customers(
    customers: &[Customer],
    orders: &[Order],
    now: DateTime<Utc>,
    config: &SegmentationConfig,
) -> Result<SegmentationReport, SegmentationError> {
    let records = compute_rfm(customers, orders, now);
    let Some(population) = PopulationStats::from_records(&records) else {
        return Err(SegmentationError::EmptyPopulation);
    };
    tracing::info!(customers = records.len(), "aggregated RFM records");

    let normalized = normalize(&records);
    let k = choose_k(&records, &normalized.matrix, config)?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let model = fit_kmeans(&normalized.matrix, k, &config.kmeans, &mut rng)?;
    tracing::info!(
        k,
        iterations = model.iterations,
        inertia = model.inertia,
        "final clustering run converged"
    );

    let silhouette = silhouette_score(&normalized.matrix, &model.labels, k);
    let stats = cluster_stats(&records, &model.labels, k);
    let clusters = rank_clusters(&stats, &config.policy);

    Ok(SegmentationReport {
        generated_at: now,
        optimal_k: k,
        assignments: assign_segments(&records, &model, &clusters),
        clusters,
        silhouette_score: silhouette,
        inertia: model.inertia,
        iterations: model.iterations,
        population,
        degenerate_axes: normalized.degenerate_axes,
    })
}

fn choose_k(
    records: &[RfmRecord],
    features: &ndarray::Array2<f64>,
    config: &SegmentationConfig,
) -> Result<usize, SegmentationError> {
    let n = records.len();
    if let Some(k) = config.fixed_k {
        return Ok(k);
    }
    if n >= config.policy.min_sweep_population {
        select_optimal_k(features, &config.kmeans, config.seed)
    } else {
        let fallback = config.policy.default_k.min(n).max(1);
        tracing::info!(
            population = n,
            k = fallback,
            "population too small for elbow sweep, using fallback K"
        );
        Ok(fallback)
    }
}

fn assign_segments(
    records: &[RfmRecord],
    model: &KMeansModel,
    clusters: &[RankedCluster],
) -> Vec<CustomerSegment> {
    let mut label_of = vec![String::new(); model.n_clusters];
    for cluster in clusters {
        label_of[cluster.cluster_id] = cluster.label.clone();
    }
    records
        .iter()
        .zip(model.labels.iter())
        .map(|(record, &cluster_id)| CustomerSegment {
            customer_id: record.customer_id.clone(),
            cluster_id,
            label: label_of[cluster_id].clone(),
        })
        .collect()
}
