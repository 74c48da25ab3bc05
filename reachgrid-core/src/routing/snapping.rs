//! Mapping arbitrary locations onto street graph nodes

use geo::Point;
use log::trace;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::model::RoutableGraph;

/// Snap `point` to its nearest graph node.
///
/// Returns `None` for an empty graph or when the nearest node is farther than
/// `max_snap_distance`. The snap distance itself is never added to network
/// costs.
pub fn snap_to_node(
    graph: &RoutableGraph,
    point: &Point<f64>,
    max_snap_distance: Option<f64>,
) -> Option<NodeIndex> {
    let (node, distance) = graph.nearest_node(point)?;
    match max_snap_distance {
        Some(limit) if distance > limit => {
            trace!(
                "Point ({}, {}) is {distance:.1} from the nearest '{}' node (max {limit}), leaving unsnapped",
                point.x(),
                point.y(),
                graph.mode()
            );
            None
        }
        _ => Some(node),
    }
}

/// Snap many points in parallel, preserving order
pub fn snap_all<'a, I>(
    graph: &RoutableGraph,
    points: I,
    max_snap_distance: Option<f64>,
) -> Vec<Option<NodeIndex>>
where
    I: IntoParallelIterator<Item = &'a Point<f64>>,
    I::Iter: IndexedParallelIterator,
{
    points
        .into_par_iter()
        .map(|point| snap_to_node(graph, point, max_snap_distance))
        .collect()
}
