//! Population-weighted distance summary

use serde::{Deserialize, Serialize};

use super::NearestResult;
use crate::algo::NeumaierSum;
use crate::model::WeightedPointSet;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistanceSummary {
    /// Population-weighted mean over reachable points, `None` if none are
    /// reachable or they carry no weight
    pub weighted_mean_distance: Option<f64>,
    /// Largest finite distance
    pub max_distance: Option<f64>,
    pub reachable_points: usize,
    pub unreachable_points: usize,
    pub reachable_population: f64,
    pub unreachable_population: f64,
}

/// Summarize nearest distances. `results` pairs with `population` by position;
/// extra entries on either side are ignored.
pub fn summarize_distances(
    population: &WeightedPointSet,
    results: &[NearestResult],
) -> DistanceSummary {
    let mut weighted = NeumaierSum::new();
    let mut reachable_population = NeumaierSum::new();
    let mut unreachable_population = NeumaierSum::new();
    let mut summary = DistanceSummary::default();

    for (point, result) in population.iter().zip(results) {
        if result.is_reachable() {
            summary.reachable_points += 1;
            reachable_population.add(point.weight);
            weighted.add(point.weight * result.distance);
            summary.max_distance = Some(
                summary
                    .max_distance
                    .map_or(result.distance, |max| max.max(result.distance)),
            );
        } else {
            summary.unreachable_points += 1;
            unreachable_population.add(point.weight);
        }
    }

    summary.reachable_population = reachable_population.total();
    summary.unreachable_population = unreachable_population.total();
    if summary.reachable_population > 0.0 {
        summary.weighted_mean_distance = Some(weighted.total() / summary.reachable_population);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ServiceId, WeightedPoint};

    #[test]
    fn weighted_mean_ignores_unreachable() {
        let population = WeightedPointSet::new(vec![
            WeightedPoint::new(0.0, 0.0, 1.0),
            WeightedPoint::new(0.0, 0.0, 3.0),
            WeightedPoint::new(0.0, 0.0, 6.0),
        ])
        .unwrap();
        let results = vec![
            NearestResult::reached(100.0, ServiceId::from("a")),
            NearestResult::reached(200.0, ServiceId::from("a")),
            NearestResult::unreachable(),
        ];

        let summary = summarize_distances(&population, &results);
        assert_eq!(summary.weighted_mean_distance, Some(175.0));
        assert_eq!(summary.max_distance, Some(200.0));
        assert_eq!(summary.reachable_points, 2);
        assert_eq!(summary.unreachable_points, 1);
        assert_eq!(summary.reachable_population, 4.0);
        assert_eq!(summary.unreachable_population, 6.0);
    }

    #[test]
    fn nothing_reachable_has_no_mean() {
        let population = WeightedPointSet::new(vec![WeightedPoint::new(0.0, 0.0, 2.0)]).unwrap();
        let summary = summarize_distances(&population, &[NearestResult::unreachable()]);

        assert_eq!(summary.weighted_mean_distance, None);
        assert_eq!(summary.max_distance, None);
    }
}
