//! Segment ranking and labeling from cluster statistics

use crate::data::RfmRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Business policy for turning cluster statistics into named segments.
///
/// The weights and label vocabulary are policy, not algorithm: they are
/// injected into the ranker so tuning them never touches clustering code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPolicy {
    /// Weight of the inverse-recency score.
    pub recency_weight: f64,
    /// Weight of the mean order count.
    pub frequency_weight: f64,
    /// Weight of the mean spend.
    pub monetary_weight: f64,
    /// Segment names in rank order, best first; ranks past the end clamp to
    /// the last entry.
    pub labels: Vec<String>,
    /// Populations below this cannot support the elbow sweep and use
    /// `default_k` instead.
    pub min_sweep_population: usize,
    /// Cluster count for populations too small for the sweep.
    pub default_k: usize,
}

impl Default for SegmentPolicy {
    fn default() -> Self {
        Self {
            recency_weight: 0.3,
            frequency_weight: 0.3,
            monetary_weight: 0.4,
            labels: vec![
                "VIP".to_string(),
                "Loyal".to_string(),
                "Potential".to_string(),
                "Pay Attention".to_string(),
            ],
            min_sweep_population: 4,
            default_k: 4,
        }
    }
}

impl SegmentPolicy {
    /// Label for a zero-based rank index, clamped to the last label.
    pub fn label_for_rank(&self, rank_index: usize) -> &str {
        match self.labels.get(rank_index) {
            Some(label) => label,
            None => self
                .labels
                .last()
                .map(String::as_str)
                .unwrap_or("Segment"),
        }
    }
}

/// Per-cluster statistics in original (denormalized) scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub cluster_id: usize,
    pub size: usize,
    pub avg_recency: f64,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
}

/// A cluster with its desirability score, rank and segment label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCluster {
    pub cluster_id: usize,
    pub size: usize,
    pub avg_recency: f64,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
    pub composite_score: f64,
    /// 1 is the most desirable segment.
    pub rank: usize,
    pub label: String,
}

/// Compute per-cluster means by re-averaging the source records assigned to
/// each cluster. Averages are in original scale; centroids are never
/// inverse-transformed.
pub fn cluster_stats(records: &[RfmRecord], labels: &[usize], n_clusters: usize) -> Vec<ClusterStats> {
    let mut recency_sums = vec![0.0; n_clusters];
    let mut frequency_sums = vec![0.0; n_clusters];
    let mut monetary_sums = vec![0.0; n_clusters];
    let mut sizes = vec![0usize; n_clusters];

    for (record, &cluster) in records.iter().zip(labels.iter()) {
        sizes[cluster] += 1;
        recency_sums[cluster] += record.recency as f64;
        frequency_sums[cluster] += record.frequency as f64;
        monetary_sums[cluster] += record.monetary;
    }

    (0..n_clusters)
        .map(|cluster| {
            let size = sizes[cluster];
            let divisor = size.max(1) as f64;
            ClusterStats {
                cluster_id: cluster,
                size,
                avg_recency: recency_sums[cluster] / divisor,
                avg_frequency: frequency_sums[cluster] / divisor,
                avg_monetary: monetary_sums[cluster] / divisor,
            }
        })
        .collect()
}

/// Score, sort and label clusters by desirability.
///
/// `composite = w_r * (1 / avg_recency) + w_f * avg_frequency +
/// w_m * avg_monetary`, with the recency term fixed at 1 when the average is
/// 0 (a same-day purchase is the freshest possible signal). Rank 1 has the
/// highest composite score.
pub fn rank_clusters(stats: &[ClusterStats], policy: &SegmentPolicy) -> Vec<RankedCluster> {
    let mut ranked: Vec<RankedCluster> = stats
        .iter()
        .map(|s| {
            let recency_score = if s.avg_recency == 0.0 {
                1.0
            } else {
                1.0 / s.avg_recency
            };
            let composite = policy.recency_weight * recency_score
                + policy.frequency_weight * s.avg_frequency
                + policy.monetary_weight * s.avg_monetary;
            RankedCluster {
                cluster_id: s.cluster_id,
                size: s.size,
                avg_recency: s.avg_recency,
                avg_frequency: s.avg_frequency,
                avg_monetary: s.avg_monetary,
                composite_score: composite,
                rank: 0,
                label: String::new(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(Ordering::Equal)
    });
    for (index, cluster) in ranked.iter_mut().enumerate() {
        cluster.rank = index + 1;
        cluster.label = policy.label_for_rank(index).to_string();
    }
    ranked
}
