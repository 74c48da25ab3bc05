use thiserror::Error;

use crate::model::TransportMode;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot build a proximity index from an empty point set")]
    EmptyIndex,
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),
    #[error("Unknown service category '{category}', available: {available:?}")]
    UnknownCategory {
        category: String,
        available: Vec<String>,
    },
    #[error("No street network bound for mode '{0}'")]
    MissingNetwork(TransportMode),
    #[error("Invalid metric '{metric}', expected one of {expected:?}")]
    InvalidMetric {
        metric: String,
        expected: Vec<String>,
    },
    #[error("Total population is zero")]
    ZeroPopulation,
    #[error("Service set is empty")]
    ZeroService,
    #[error("Invalid threshold {0}: must be a non-negative number")]
    InvalidThreshold(f64),
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("Engine is not ready: {0}")]
    NotReady(&'static str),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}

impl Error {
    /// True for failures caused by the caller naming something the engine
    /// does not hold (category, mode, metric).
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Error::UnknownCategory { .. } | Error::MissingNetwork(_) | Error::InvalidMetric { .. }
        )
    }
}
