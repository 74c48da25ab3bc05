//! Data model for accessibility analysis
//!
//! Population, services and street networks as the engine consumes them:
//! already projected into one linear-unit CRS and immutable once built.

pub mod network;
pub mod population;
pub mod raster;
pub mod services;

pub use network::{CostKind, EdgeRecord, RoutableGraph, StreetEdge, StreetNode, TransportMode};
pub use population::{WeightedPoint, WeightedPointSet};
pub use raster::{DEFAULT_NODATA, GeoTransform, PopulationRaster};
pub use services::{Category, ServiceId, ServicePoint, ServiceSet};
