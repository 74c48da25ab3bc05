//! Per-point distance to the nearest service

use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algo::ProximityIndex;
use crate::model::{ServiceId, ServiceSet, WeightedPointSet};
use crate::routing::ServiceField;

/// Distance from one population point to its nearest service.
///
/// An infinite distance with no service id means no service is reachable.
/// Under ties between equally distant services the reported id is any one
/// of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestResult {
    /// `null` in serialized form when unreachable
    #[serde(with = "super::infinity")]
    pub distance: f64,
    pub source_service_id: Option<ServiceId>,
}

impl NearestResult {
    pub fn reached(distance: f64, service: ServiceId) -> Self {
        Self {
            distance,
            source_service_id: Some(service),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            distance: f64::INFINITY,
            source_service_id: None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.distance.is_finite()
    }
}

/// Straight-line distance from every population point to its nearest service
pub fn euclidean_nearest(
    population: &WeightedPointSet,
    index: &ProximityIndex,
) -> Vec<NearestResult> {
    population
        .points()
        .par_iter()
        .map(|point| match index.nearest(&point.location) {
            Some(found) => NearestResult::reached(found.distance, found.id.clone()),
            None => NearestResult::unreachable(),
        })
        .collect()
}

/// Network cost from every snapped population point to its nearest service.
///
/// `snapped` holds one entry per population point, in the same order.
/// Unsnapped points and points in components without a service are
/// unreachable.
pub fn network_nearest(
    snapped: &[Option<NodeIndex>],
    field: &ServiceField,
    services: &ServiceSet,
) -> Vec<NearestResult> {
    snapped
        .par_iter()
        .map(|node| {
            node.and_then(|node| field.nearest(node))
                .and_then(|(cost, slot)| {
                    services
                        .get(slot)
                        .map(|service| NearestResult::reached(cost, service.id.clone()))
                })
                .unwrap_or_else(NearestResult::unreachable)
        })
        .collect()
}
