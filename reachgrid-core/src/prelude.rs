pub use crate::Error;

// Binding data and running queries
pub use crate::engine::{
    AccessibilityEngine, AccessibilityReport, EngineBuilder, EngineConfig, LinearUnit, Metric,
};
pub use crate::loading::{
    NetworkSource, load_network_csv, load_population_csv, load_services_geojson,
};

// Input model
pub use crate::model::{
    Category, CostKind, EdgeRecord, PopulationRaster, RoutableGraph, ServiceId, ServicePoint,
    ServiceSet, StreetNode, TransportMode, WeightedPoint, WeightedPointSet,
};

// Query results
pub use crate::metrics::{
    AnalysisUnit, CoverageStats, DistanceSummary, NearestResult, PerCapitaMetrics, UnitSummary,
    grid_units,
};

pub use crate::Cost; // seconds or CRS units
pub use crate::NodeId;
