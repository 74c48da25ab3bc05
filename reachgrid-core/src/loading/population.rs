use std::io::Read;
use std::path::Path;

use log::info;
use serde::Deserialize;

use super::open_file;
use crate::Error;
use crate::model::{WeightedPoint, WeightedPointSet};

#[derive(Debug, Deserialize)]
struct PopulationRecord {
    x: f64,
    y: f64,
    population: f64,
}

/// Read `x,y,population` rows into a [`WeightedPointSet`]
///
/// # Errors
///
/// Returns [`Error::CsvError`] for malformed rows and [`Error::InvalidData`]
/// for negative or non-finite values.
pub fn population_from_reader<R: Read>(reader: R) -> Result<WeightedPointSet, Error> {
    let points = csv::Reader::from_reader(reader)
        .deserialize::<PopulationRecord>()
        .map(|record| record.map(|r| WeightedPoint::new(r.x, r.y, r.population)))
        .collect::<Result<Vec<_>, _>>()?;

    WeightedPointSet::new(points)
}

/// # Errors
///
/// See [`population_from_reader`]; also fails if the file cannot be opened.
pub fn load_population_csv(path: &Path) -> Result<WeightedPointSet, Error> {
    let population = population_from_reader(open_file(path)?)?;
    info!(
        "Loaded {} population points ({:.1} people) from {}",
        population.len(),
        population.total_weight(),
        path.display()
    );
    Ok(population)
}
