//! Geometric and numeric building blocks shared by the metrics

pub mod proximity;
pub mod summation;

pub use proximity::{IndexedPoint, NearestService, PointIndex, ProximityIndex};
pub use summation::NeumaierSum;
