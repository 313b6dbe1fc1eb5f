//! Clustering quality metrics: WCSS and silhouette score

use crate::model::squared_distance;
use ndarray::Array2;

/// Within-cluster sum of squares: total squared Euclidean distance from each
/// point to its assigned centroid, in normalized space. Lower is tighter.
pub fn wcss(features: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    features
        .outer_iter()
        .zip(labels.iter())
        .map(|(point, &cluster)| squared_distance(point, centroids.row(cluster)))
        .sum()
}

/// Mean silhouette coefficient over all points, in `[-1, 1]`.
///
/// For point `i` in cluster `C`: `a(i)` is the mean distance to the other
/// members of `C` (0 when `i` is alone), `b(i)` the smallest mean distance
/// to the members of any other non-empty cluster. A point with `a` and `b`
/// both 0 contributes 0 rather than NaN. Defined as 0 for populations of at
/// most one point or fewer than two clusters.
pub fn silhouette_score(features: &Array2<f64>, labels: &[usize], n_clusters: usize) -> f64 {
    let n_samples = features.nrows();
    if n_samples <= 1 || n_clusters < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in 0..n_samples {
        let own_cluster = labels[i];
        let point = features.row(i);

        let mut own_distance_sum = 0.0;
        let mut own_count = 0usize;
        let mut other_distance_sums = vec![0.0; n_clusters];
        let mut other_counts = vec![0usize; n_clusters];

        for j in 0..n_samples {
            if i == j {
                continue;
            }
            let distance = squared_distance(point, features.row(j)).sqrt();
            if labels[j] == own_cluster {
                own_distance_sum += distance;
                own_count += 1;
            } else {
                other_distance_sums[labels[j]] += distance;
                other_counts[labels[j]] += 1;
            }
        }

        let a = if own_count > 0 {
            own_distance_sum / own_count as f64
        } else {
            0.0
        };

        let b = (0..n_clusters)
            .filter(|&c| c != own_cluster && other_counts[c] > 0)
            .map(|c| other_distance_sums[c] / other_counts[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let s = if b.is_infinite() || (a == 0.0 && b == 0.0) {
            0.0
        } else {
            (b - a) / a.max(b)
        };
        total += s;
    }

    total / n_samples as f64
}
