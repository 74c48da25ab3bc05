//! Population mass resolved to weighted points

use geo::Point;
use rayon::prelude::*;

use crate::Error;
use crate::algo::summation::NeumaierSum;

/// Population mass at a discrete position (usually a raster cell centre)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPoint {
    /// Projected coordinates
    pub location: Point<f64>,
    /// Number of people represented by this point
    pub weight: f64,
}

impl WeightedPoint {
    pub fn new(x: f64, y: f64, weight: f64) -> Self {
        Self {
            location: Point::new(x, y),
            weight,
        }
    }
}

/// Immutable collection of population points for one area of interest.
///
/// Weights are guaranteed finite and non-negative; locations may repeat.
#[derive(Debug, Clone, Default)]
pub struct WeightedPointSet {
    points: Vec<WeightedPoint>,
    total_weight: f64,
}

impl WeightedPointSet {
    /// Validates weights and locations and precomputes the total weight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] for negative or non-finite weights and
    /// for non-finite coordinates.
    pub fn new(points: Vec<WeightedPoint>) -> Result<Self, Error> {
        for (idx, point) in points.iter().enumerate() {
            if !point.weight.is_finite() || point.weight < 0.0 {
                return Err(Error::InvalidData(format!(
                    "population point {idx} has invalid weight {}",
                    point.weight
                )));
            }
            if !point.location.x().is_finite() || !point.location.y().is_finite() {
                return Err(Error::InvalidData(format!(
                    "population point {idx} has non-finite coordinates"
                )));
            }
        }

        let total_weight = points
            .par_iter()
            .fold(NeumaierSum::new, |mut acc, p| {
                acc.add(p.weight);
                acc
            })
            .reduce(NeumaierSum::new, NeumaierSum::merge)
            .total();

        Ok(Self {
            points,
            total_weight,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[WeightedPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WeightedPoint> {
        self.points.iter()
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }
}

impl<'a> IntoIterator for &'a WeightedPointSet {
    type Item = &'a WeightedPoint;
    type IntoIter = std::slice::Iter<'a, WeightedPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
