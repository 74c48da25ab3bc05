//! Population-weighted accessibility analysis.
//!
//! `reachgrid_core` answers "how far is every resident from the nearest
//! service of a category, and what share of the population lies within a
//! threshold of one", under straight-line or street-network distance.
//! Data is bound once through [`engine::EngineBuilder`]; the resulting
//! [`engine::AccessibilityEngine`] answers any number of concurrent queries.

pub mod algo;
pub mod engine;
mod error;
pub mod loading;
pub mod metrics;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;

/// Accumulated network cost: seconds for travel-time graphs, CRS units for
/// length graphs
pub type Cost = f64;
/// External street node id
pub type NodeId = u64;
