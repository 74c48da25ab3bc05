//! Share of population within a distance threshold of a service

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::NearestResult;
use crate::Error;
use crate::algo::NeumaierSum;
use crate::model::WeightedPointSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageStats {
    /// `covered_population / total_population`, 0 when `degenerate`
    pub coverage_ratio: f64,
    pub covered_population: f64,
    pub total_population: f64,
    /// Set when the total population is zero and the ratio is meaningless
    pub degenerate: bool,
}

impl CoverageStats {
    pub(crate) fn from_totals(covered_population: f64, total_population: f64) -> Self {
        if total_population > 0.0 {
            Self {
                coverage_ratio: (covered_population / total_population).clamp(0.0, 1.0),
                covered_population,
                total_population,
                degenerate: false,
            }
        } else {
            Self {
                coverage_ratio: 0.0,
                covered_population,
                total_population,
                degenerate: true,
            }
        }
    }
}

/// Thresholds must be non-negative numbers; `+inf` is accepted.
///
/// # Errors
///
/// Returns [`Error::InvalidThreshold`] for NaN or negative values.
pub fn validate_threshold(threshold: f64) -> Result<(), Error> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(Error::InvalidThreshold(threshold));
    }
    Ok(())
}

pub(crate) fn is_covered(result: &NearestResult, threshold: f64) -> bool {
    result.distance.is_finite() && result.distance <= threshold
}

fn check_lengths(population: &WeightedPointSet, results: &[NearestResult]) -> Result<(), Error> {
    if population.len() != results.len() {
        return Err(Error::InvalidData(format!(
            "{} nearest results for {} population points",
            results.len(),
            population.len()
        )));
    }
    Ok(())
}

/// Population weight whose nearest service lies within `threshold`.
///
/// Unreachable points are never covered, whatever the threshold.
///
/// # Errors
///
/// Returns [`Error::InvalidThreshold`] for an invalid threshold and
/// [`Error::InvalidData`] if `results` does not match `population`.
pub fn calculate_coverage(
    population: &WeightedPointSet,
    results: &[NearestResult],
    threshold: f64,
) -> Result<CoverageStats, Error> {
    validate_threshold(threshold)?;
    check_lengths(population, results)?;

    let covered = population
        .points()
        .par_iter()
        .zip(results.par_iter())
        .fold(NeumaierSum::new, |mut acc, (point, result)| {
            if is_covered(result, threshold) {
                acc.add(point.weight);
            }
            acc
        })
        .reduce(NeumaierSum::new, NeumaierSum::merge)
        .total();

    Ok(CoverageStats::from_totals(covered, population.total_weight()))
}

/// Coverage at several thresholds from a single nearest-distance pass
///
/// # Errors
///
/// Same as [`calculate_coverage`], checked for every threshold up front.
pub fn coverage_curve(
    population: &WeightedPointSet,
    results: &[NearestResult],
    thresholds: &[f64],
) -> Result<Vec<CoverageStats>, Error> {
    for &threshold in thresholds {
        validate_threshold(threshold)?;
    }
    thresholds
        .iter()
        .map(|&threshold| calculate_coverage(population, results, threshold))
        .collect()
}
