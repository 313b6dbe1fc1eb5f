//! Elbow-method selection of the cluster count

use crate::error::SegmentationError;
use crate::model::{fit_kmeans, KMeansConfig};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Smallest cluster count the sweep considers.
pub const MIN_K: usize = 2;
/// Largest cluster count the sweep considers.
pub const MAX_K: usize = 8;

/// Candidate cluster counts for a population: `2..=min(8, n/2)`.
///
/// Empty when the population cannot support the sweep (fewer than 4
/// customers); callers fall back to a fixed cluster count in that case.
pub fn candidate_ks(population: usize) -> Vec<usize> {
    let upper = MAX_K.min(population / 2);
    (MIN_K..=upper).collect()
}

/// Run one independent clustering trial per candidate K and collect the WCSS
/// curve, in candidate order.
///
/// Trials only read the shared feature matrix, so they fan out across the
/// rayon pool; each gets its own rng so seeding stays uncorrelated between
/// trials and reproducible when `seed` is set.
pub fn sweep_wcss(
    features: &Array2<f64>,
    candidates: &[usize],
    config: &KMeansConfig,
    seed: Option<u64>,
) -> Result<Vec<(usize, f64)>, SegmentationError> {
    candidates
        .par_iter()
        .map(|&k| {
            let mut rng = trial_rng(seed, k);
            let model = fit_kmeans(features, k, config, &mut rng)?;
            Ok((k, model.inertia))
        })
        .collect()
}

fn trial_rng(seed: Option<u64>, k: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(k as u64)),
        None => StdRng::from_entropy(),
    }
}

/// Pick the elbow of a WCSS curve.
///
/// For each interior candidate the sharpness score is the drop in WCSS it
/// brings minus the drop the next candidate brings; the candidate with the
/// largest strictly positive score wins. Falls back to the first (minimum)
/// candidate when the curve is too short or no candidate sharpens it.
pub fn elbow_point(curve: &[(usize, f64)]) -> usize {
    let Some(&(first_k, _)) = curve.first() else {
        return MIN_K;
    };
    let mut best_k = first_k;
    let mut best_score = 0.0;
    for i in 1..curve.len().saturating_sub(1) {
        let improvement = curve[i - 1].1 - curve[i].1;
        let next_improvement = curve[i].1 - curve[i + 1].1;
        let score = improvement - next_improvement;
        if score > best_score {
            best_score = score;
            best_k = curve[i].0;
        }
    }
    best_k
}

/// Sweep candidate cluster counts and return the elbow-optimal K.
pub fn select_optimal_k(
    features: &Array2<f64>,
    config: &KMeansConfig,
    seed: Option<u64>,
) -> Result<usize, SegmentationError> {
    let candidates = candidate_ks(features.nrows());
    let curve = sweep_wcss(features, &candidates, config, seed)?;
    let optimal = elbow_point(&curve);
    tracing::debug!(?curve, optimal, "elbow sweep complete");
    Ok(optimal)
}
