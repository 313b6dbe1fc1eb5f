//! Error taxonomy for the segmentation pipeline

use thiserror::Error;

/// Failures the core pipeline can report.
///
/// Degenerate feature axes and empty clusters during iteration are not
/// errors; they are handled in place and surfaced as flags or debug logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentationError {
    /// No customers with delivered orders; clustering is never attempted.
    #[error("no customers with delivered orders to segment")]
    EmptyPopulation,

    /// Requested cluster count cannot partition the population.
    #[error("invalid cluster count {k} for a population of {population}")]
    InvalidClusterCount { k: usize, population: usize },
}
