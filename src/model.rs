//! K-Means clustering engine with k-means++ initialization

use crate::error::SegmentationError;
use ndarray::{Array2, ArrayView1};
use rand::Rng;

/// Convergence parameters for a clustering run.
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Hard cap on Lloyd iterations.
    pub max_iterations: usize,
    /// A run converges once every centroid coordinate moves less than this
    /// between iterations.
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-4,
        }
    }
}

/// Fitted K-Means model over normalized RFM vectors.
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster centroids in normalized space, shape `(k, 3)`
    pub centroids: Array2<f64>,
    /// Cluster index per input row
    pub labels: Vec<usize>,
    /// Lloyd iterations actually run before convergence or the cap
    pub iterations: usize,
    /// Within-cluster sum of squares (inertia) in normalized space
    pub inertia: f64,
}

impl KMeansModel {
    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in &self.labels {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }
}

/// Fit K-Means on a normalized feature matrix.
///
/// Initialization is k-means++: the first centroid is drawn uniformly from
/// the input rows and each subsequent centroid is sampled with probability
/// proportional to its squared distance from the nearest already-chosen
/// centroid. Iteration alternates nearest-centroid assignment (ties broken
/// toward the lowest cluster index) with coordinate-wise mean updates; a
/// cluster left without points is reseeded to a uniform random point in the
/// unit cube, which keeps k clusters alive at the cost of run-to-run
/// variation when the rng is not seeded.
///
/// Deterministic for a fixed `rng` state.
pub fn fit_kmeans<R: Rng + ?Sized>(
    features: &Array2<f64>,
    k: usize,
    config: &KMeansConfig,
    rng: &mut R,
) -> Result<KMeansModel, SegmentationError> {
    let n_samples = features.nrows();
    if k == 0 || k > n_samples {
        return Err(SegmentationError::InvalidClusterCount {
            k,
            population: n_samples,
        });
    }

    let dims = features.ncols();
    let mut centroids = init_centroids(features, k, rng);
    let mut labels = vec![0usize; n_samples];
    let mut iterations = 0;

    for iteration in 0..config.max_iterations {
        iterations = iteration + 1;

        for (row, point) in features.outer_iter().enumerate() {
            labels[row] = nearest_centroid(point, &centroids);
        }

        let mut sums = Array2::<f64>::zeros((k, dims));
        let mut counts = vec![0usize; k];
        for (row, &cluster) in labels.iter().enumerate() {
            counts[cluster] += 1;
            for (axis, value) in features.row(row).iter().enumerate() {
                sums[[cluster, axis]] += value;
            }
        }

        let mut max_shift = 0.0f64;
        for cluster in 0..k {
            if counts[cluster] > 0 {
                for axis in 0..dims {
                    let next = sums[[cluster, axis]] / counts[cluster] as f64;
                    let shift = (next - centroids[[cluster, axis]]).abs();
                    if shift > max_shift {
                        max_shift = shift;
                    }
                    centroids[[cluster, axis]] = next;
                }
            } else {
                tracing::debug!(cluster, iteration, "empty cluster reseeded");
                for axis in 0..dims {
                    centroids[[cluster, axis]] = rng.gen::<f64>();
                }
                max_shift = f64::INFINITY;
            }
        }

        if max_shift < config.tolerance {
            break;
        }
    }

    let inertia = crate::eval::wcss(features, &labels, &centroids);
    Ok(KMeansModel {
        n_clusters: k,
        centroids,
        labels,
        iterations,
        inertia,
    })
}

/// k-means++ seeding with D²-weighted sampling.
fn init_centroids<R: Rng + ?Sized>(features: &Array2<f64>, k: usize, rng: &mut R) -> Array2<f64> {
    let n_samples = features.nrows();
    let mut centroids = Array2::zeros((k, features.ncols()));

    let first = rng.gen_range(0..n_samples);
    centroids.row_mut(0).assign(&features.row(first));

    for chosen in 1..k {
        let weights: Vec<f64> = features
            .outer_iter()
            .map(|point| {
                (0..chosen)
                    .map(|c| squared_distance(point, centroids.row(c)))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();

        let total: f64 = weights.iter().sum();
        let picked = if total > 0.0 {
            let threshold = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut picked = n_samples - 1;
            for (row, weight) in weights.iter().enumerate() {
                cumulative += weight;
                if cumulative >= threshold {
                    picked = row;
                    break;
                }
            }
            picked
        } else {
            // Every remaining point coincides with a chosen centroid.
            rng.gen_range(0..n_samples)
        };
        centroids.row_mut(chosen).assign(&features.row(picked));
    }

    centroids
}

/// Index of the nearest centroid, scanning in index order and replacing only
/// on strict improvement so ties resolve to the lowest cluster index.
fn nearest_centroid(point: ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut best_cluster = 0;
    let mut best_distance = f64::INFINITY;
    for (cluster, centroid) in centroids.outer_iter().enumerate() {
        let distance = squared_distance(point, centroid);
        if distance < best_distance {
            best_distance = distance;
            best_cluster = cluster;
        }
    }
    best_cluster
}

/// Squared Euclidean distance between two points.
pub(crate) fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
