//! Aggregation of population, services and coverage into analysis units
//! (administrative areas or a regular grid clipped to the area of interest).

use geo::{Area, BooleanOps, BoundingRect, Contains, Intersects, MultiPolygon, Rect, coord};
use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use super::NearestResult;
use super::coverage::{CoverageStats, is_covered, validate_threshold};
use crate::Error;
use crate::algo::{NeumaierSum, PointIndex};
use crate::model::{ServiceSet, WeightedPointSet};

/// Upper bound on generated grid cells before clipping
const MAX_GRID_CELLS: usize = 4_000_000;

#[derive(Debug, Clone)]
pub struct AnalysisUnit {
    pub id: usize,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl AnalysisUnit {
    pub fn new(id: usize, name: impl Into<String>, geometry: impl Into<MultiPolygon<f64>>) -> Self {
        Self {
            id,
            name: name.into(),
            geometry: geometry.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSummary {
    pub unit_id: usize,
    pub name: String,
    pub population: f64,
    pub service_count: usize,
    pub coverage: CoverageStats,
}

/// Square cells of `cell_size` laid over the bounds of `aoi`, clipped to it.
/// Cells left empty by clipping are dropped and ids are renumbered.
///
/// # Errors
///
/// Returns [`Error::InvalidData`] for a non-positive cell size or a grid that
/// would be unreasonably large.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn grid_units(aoi: &MultiPolygon<f64>, cell_size: f64) -> Result<Vec<AnalysisUnit>, Error> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(Error::InvalidData(format!("invalid grid cell size {cell_size}")));
    }
    let Some(bounds) = aoi.bounding_rect() else {
        return Ok(Vec::new());
    };

    let cols = ((bounds.width() / cell_size).ceil() as usize).max(1);
    let rows = ((bounds.height() / cell_size).ceil() as usize).max(1);
    if cols.saturating_mul(rows) > MAX_GRID_CELLS {
        return Err(Error::InvalidData(format!(
            "grid of {cols}x{rows} cells exceeds {MAX_GRID_CELLS}"
        )));
    }

    let origin = bounds.min();
    let mut units = Vec::new();
    for col in 0..cols {
        for row in 0..rows {
            let cell = Rect::new(
                coord! {
                    x: origin.x + col as f64 * cell_size,
                    y: origin.y + row as f64 * cell_size,
                },
                coord! {
                    x: origin.x + (col + 1) as f64 * cell_size,
                    y: origin.y + (row + 1) as f64 * cell_size,
                },
            )
            .to_polygon();
            if !cell.intersects(aoi) {
                continue;
            }
            let clipped = aoi.intersection(&cell);
            if clipped.unsigned_area() <= 0.0 {
                continue;
            }
            let id = units.len();
            units.push(AnalysisUnit::new(id, id.to_string(), clipped));
        }
    }

    debug!("Built {} grid units of size {cell_size}", units.len());
    Ok(units)
}

/// Payloads of indexed points strictly inside `unit`
fn members<'a, T>(index: &'a PointIndex<T>, unit: &AnalysisUnit) -> Vec<&'a T> {
    let Some(rect) = unit.geometry.bounding_rect() else {
        return Vec::new();
    };
    index
        .in_rect(&rect)
        .into_iter()
        .filter(|(point, _)| unit.geometry.contains(point))
        .map(|(_, data)| data)
        .collect()
}

/// Total population weight inside every unit
pub fn sum_population_to_units(units: &[AnalysisUnit], population: &WeightedPointSet) -> Vec<f64> {
    let Ok(index) =
        PointIndex::bulk_load(population.iter().map(|p| (p.location, p.weight)).collect())
    else {
        return vec![0.0; units.len()];
    };

    units
        .par_iter()
        .map(|unit| {
            members(&index, unit)
                .into_iter()
                .copied()
                .collect::<NeumaierSum>()
                .total()
        })
        .collect()
}

/// Number of services inside every unit
pub fn count_services_to_units(units: &[AnalysisUnit], services: &ServiceSet) -> Vec<usize> {
    let Ok(index) = PointIndex::bulk_load(services.iter().map(|s| (s.location, ())).collect())
    else {
        return vec![0; units.len()];
    };

    units
        .par_iter()
        .map(|unit| members(&index, unit).len())
        .collect()
}

/// Population, service count and coverage at `threshold` for every unit
///
/// # Errors
///
/// Returns [`Error::InvalidThreshold`] for an invalid threshold and
/// [`Error::InvalidData`] if `results` does not match `population`.
pub fn summarize_units(
    units: &[AnalysisUnit],
    population: &WeightedPointSet,
    results: &[NearestResult],
    services: &ServiceSet,
    threshold: f64,
) -> Result<Vec<UnitSummary>, Error> {
    validate_threshold(threshold)?;
    if population.len() != results.len() {
        return Err(Error::InvalidData(format!(
            "{} nearest results for {} population points",
            results.len(),
            population.len()
        )));
    }

    let service_counts = count_services_to_units(units, services);
    let index = PointIndex::bulk_load(
        population
            .iter()
            .enumerate()
            .map(|(slot, p)| (p.location, slot))
            .collect(),
    )
    .ok();

    let summaries = units
        .par_iter()
        .zip(service_counts.par_iter())
        .map(|(unit, &service_count)| {
            let mut total = NeumaierSum::new();
            let mut covered = NeumaierSum::new();
            if let Some(index) = &index {
                for &slot in members(index, unit) {
                    let weight = population.points()[slot].weight;
                    total.add(weight);
                    if is_covered(&results[slot], threshold) {
                        covered.add(weight);
                    }
                }
            }
            UnitSummary {
                unit_id: unit.id,
                name: unit.name.clone(),
                population: total.total(),
                service_count,
                coverage: CoverageStats::from_totals(covered.total(), total.total()),
            }
        })
        .collect();

    Ok(summaries)
}
