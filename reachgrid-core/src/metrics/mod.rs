//! Accessibility and equity metrics
//!
//! Everything here is metric-agnostic: Euclidean and network nearest
//! distances feed the same coverage, per-capita and unit aggregation code.

pub mod coverage;
pub mod infinity;
pub mod nearest;
pub mod per_capita;
pub mod summary;
pub mod units;

pub use coverage::{CoverageStats, calculate_coverage, coverage_curve, validate_threshold};
pub use nearest::{NearestResult, euclidean_nearest, network_nearest};
pub use per_capita::{PerCapitaMetrics, calculate_per_capita, people_per_service, services_per_1000};
pub use summary::{DistanceSummary, summarize_distances};
pub use units::{
    AnalysisUnit, UnitSummary, count_services_to_units, grid_units, sum_population_to_units,
    summarize_units,
};
