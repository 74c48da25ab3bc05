//! Service density normalised by population

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::model::{ServiceSet, WeightedPointSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerCapitaMetrics {
    pub services_per_1000: f64,
    pub people_per_service: f64,
    pub service_count: usize,
    pub total_population: f64,
}

/// `service_count / total_population * 1000`
///
/// # Errors
///
/// Returns [`Error::ZeroPopulation`] when `total_population` is not positive.
#[allow(clippy::cast_precision_loss)]
pub fn services_per_1000(service_count: usize, total_population: f64) -> Result<f64, Error> {
    if total_population <= 0.0 {
        return Err(Error::ZeroPopulation);
    }
    Ok(service_count as f64 / total_population * 1000.0)
}

/// `total_population / service_count`
///
/// # Errors
///
/// Returns [`Error::ZeroService`] when there are no services.
#[allow(clippy::cast_precision_loss)]
pub fn people_per_service(service_count: usize, total_population: f64) -> Result<f64, Error> {
    if service_count == 0 {
        return Err(Error::ZeroService);
    }
    Ok(total_population / service_count as f64)
}

/// Both per-capita figures for one category. A zero population is reported
/// before an empty service set.
///
/// # Errors
///
/// [`Error::ZeroPopulation`] or [`Error::ZeroService`].
pub fn calculate_per_capita(
    population: &WeightedPointSet,
    services: &ServiceSet,
) -> Result<PerCapitaMetrics, Error> {
    let total_population = population.total_weight();
    let service_count = services.len();

    Ok(PerCapitaMetrics {
        services_per_1000: services_per_1000(service_count, total_population)?,
        people_per_service: people_per_service(service_count, total_population)?,
        service_count,
        total_population,
    })
}
