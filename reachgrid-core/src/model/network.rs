//! Routable street network for one transport mode

use std::fmt;
use std::str::FromStr;

use geo::Point;
use hashbrown::HashMap;
use log::info;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::{Cost, Error, NodeId};
use crate::algo::PointIndex;

/// Transport mode a street network is routable for
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransportMode {
    Walk,
    Bike,
    Drive,
    /// Any other network type supplied by the data collaborator
    Other(String),
}

impl TransportMode {
    pub fn as_str(&self) -> &str {
        match self {
            TransportMode::Walk => "walk",
            TransportMode::Bike => "bike",
            TransportMode::Drive => "drive",
            TransportMode::Other(name) => name,
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "" => Err(Error::InvalidData("empty transport mode".to_string())),
            "walk" => Ok(TransportMode::Walk),
            "bike" => Ok(TransportMode::Bike),
            "drive" => Ok(TransportMode::Drive),
            _ => Ok(TransportMode::Other(name)),
        }
    }
}

impl TryFrom<String> for TransportMode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransportMode> for String {
    fn from(value: TransportMode) -> Self {
        value.as_str().to_string()
    }
}

/// What the edge cost attribute measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    /// Travel time in seconds, reported in minutes
    #[default]
    TravelTime,
    /// Length in the CRS linear unit, reported unchanged
    Length,
}

impl CostKind {
    /// Convert a raw accumulated edge cost into the unit thresholds use
    pub fn to_report_units(self, cost: Cost) -> f64 {
        match self {
            CostKind::TravelTime => cost / 60.0,
            CostKind::Length => cost,
        }
    }
}

/// Street graph node
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// External (e.g. OSM) id of the node
    pub id: NodeId,
    /// Projected node coordinates
    pub geometry: Point<f64>,
}

/// Street graph edge (street segment)
#[derive(Debug, Clone, Copy)]
pub struct StreetEdge {
    /// Travel cost, finite and non-negative
    pub cost: Cost,
}

/// Directed edge as delivered by the network loader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRecord {
    pub from: NodeId,
    pub to: NodeId,
    pub cost: Cost,
}

impl EdgeRecord {
    pub fn new(from: NodeId, to: NodeId, cost: Cost) -> Self {
        Self { from, to, cost }
    }
}

/// Weighted directed street network with a node snapping index.
///
/// Every edge cost is finite and non-negative; construction fails otherwise.
/// The graph is read-only once built:
///
/// ```compile_fail
/// use reachgrid_core::model::{CostKind, RoutableGraph, StreetEdge, TransportMode};
///
/// let mut graph =
///     RoutableGraph::new(TransportMode::Walk, CostKind::Length, Vec::new(), Vec::new()).unwrap();
/// let a = graph.graph.add_node(todo!());
/// graph.graph.add_edge(a, a, StreetEdge { cost: -100.0 });
/// ```
#[derive(Debug, Clone)]
pub struct RoutableGraph {
    mode: TransportMode,
    cost_kind: CostKind,
    graph: DiGraph<StreetNode, StreetEdge>,
    id_map: HashMap<NodeId, NodeIndex>,
    rtree: Option<PointIndex<NodeIndex>>,
}

impl RoutableGraph {
    /// # Errors
    ///
    /// Returns [`Error::InvalidGraph`] for duplicate node ids, non-finite node
    /// coordinates, edges referencing unknown nodes, and negative or
    /// non-finite edge costs.
    pub fn new(
        mode: TransportMode,
        cost_kind: CostKind,
        nodes: Vec<StreetNode>,
        edges: Vec<EdgeRecord>,
    ) -> Result<Self, Error> {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut id_map = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if !node.geometry.x().is_finite() || !node.geometry.y().is_finite() {
                return Err(Error::InvalidGraph(format!(
                    "node {} has non-finite coordinates",
                    node.id
                )));
            }
            let id = node.id;
            let idx = graph.add_node(node);
            if id_map.insert(id, idx).is_some() {
                return Err(Error::InvalidGraph(format!("duplicate node id {id}")));
            }
        }

        for edge in edges {
            if !edge.cost.is_finite() || edge.cost < 0.0 {
                return Err(Error::InvalidGraph(format!(
                    "edge {} -> {} has invalid cost {}",
                    edge.from, edge.to, edge.cost
                )));
            }
            let lookup = |id: NodeId| {
                id_map.get(&id).copied().ok_or_else(|| {
                    Error::InvalidGraph(format!("edge references unknown node {id}"))
                })
            };
            let (from, to) = (lookup(edge.from)?, lookup(edge.to)?);
            graph.add_edge(from, to, StreetEdge { cost: edge.cost });
        }

        let rtree = if graph.node_count() == 0 {
            None
        } else {
            Some(PointIndex::bulk_load(
                graph
                    .node_indices()
                    .map(|idx| (graph[idx].geometry, idx))
                    .collect(),
            )?)
        };

        info!(
            "Built '{mode}' street graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            mode,
            cost_kind,
            graph,
            id_map,
            rtree,
        })
    }

    pub fn mode(&self) -> &TransportMode {
        &self.mode
    }

    pub fn cost_kind(&self) -> CostKind {
        self.cost_kind
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        node.index() < self.graph.node_count()
    }

    /// Internal index of the node with external id `id`
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_map.get(&id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&StreetNode> {
        self.graph.node_weight(idx)
    }

    /// Snap `point` to the closest graph node, returning it with the
    /// straight-line snap distance
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, f64)> {
        self.rtree
            .as_ref()
            .and_then(|tree| tree.nearest(point))
            .map(|(distance, &node)| (node, distance))
    }

    pub fn edges_directed(
        &self,
        node: NodeIndex,
        direction: Direction,
    ) -> petgraph::graph::Edges<'_, StreetEdge, petgraph::Directed> {
        self.graph.edges_directed(node, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: NodeId, x: f64, y: f64) -> StreetNode {
        StreetNode {
            id,
            geometry: Point::new(x, y),
        }
    }

    #[test]
    fn builds_and_snaps() {
        let graph = RoutableGraph::new(
            TransportMode::Walk,
            CostKind::Length,
            vec![node(10, 0.0, 0.0), node(20, 100.0, 0.0)],
            vec![EdgeRecord::new(10, 20, 100.0)],
        )
        .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let (snapped, distance) = graph.nearest_node(&Point::new(90.0, 5.0)).unwrap();
        assert_eq!(Some(snapped), graph.node_index(20));
        assert!((distance - 125f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn rejects_negative_cost() {
        let result = RoutableGraph::new(
            TransportMode::Drive,
            CostKind::TravelTime,
            vec![node(1, 0.0, 0.0), node(2, 1.0, 0.0)],
            vec![EdgeRecord::new(1, 2, -3.0)],
        );
        assert!(matches!(result, Err(Error::InvalidGraph(_))));
    }

    #[test]
    fn built_graph_exposes_only_validated_costs() {
        let graph = RoutableGraph::new(
            TransportMode::Walk,
            CostKind::TravelTime,
            vec![node(1, 0.0, 0.0), node(2, 10.0, 0.0), node(3, 20.0, 0.0)],
            vec![
                EdgeRecord::new(1, 2, 0.0),
                EdgeRecord::new(2, 3, 30.0),
                EdgeRecord::new(3, 1, 45.5),
            ],
        )
        .unwrap();

        let mut costs: Vec<f64> = (0..graph.node_count())
            .flat_map(|i| graph.edges_directed(NodeIndex::new(i), Direction::Outgoing))
            .map(|edge| edge.weight().cost)
            .collect();
        costs.sort_by(f64::total_cmp);
        assert_eq!(costs, vec![0.0, 30.0, 45.5]);
    }

    #[test]
    fn rejects_dangling_edge_and_duplicate_nodes() {
        let dangling = RoutableGraph::new(
            TransportMode::Walk,
            CostKind::Length,
            vec![node(1, 0.0, 0.0)],
            vec![EdgeRecord::new(1, 99, 1.0)],
        );
        assert!(matches!(dangling, Err(Error::InvalidGraph(_))));

        let duplicate = RoutableGraph::new(
            TransportMode::Walk,
            CostKind::Length,
            vec![node(1, 0.0, 0.0), node(1, 5.0, 0.0)],
            Vec::new(),
        );
        assert!(matches!(duplicate, Err(Error::InvalidGraph(_))));
    }

    #[test]
    fn empty_graph_snaps_nothing() {
        let graph =
            RoutableGraph::new(TransportMode::Bike, CostKind::Length, Vec::new(), Vec::new())
                .unwrap();
        assert!(graph.nearest_node(&Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("Walk".parse::<TransportMode>().unwrap(), TransportMode::Walk);
        assert_eq!(
            "tram".parse::<TransportMode>().unwrap(),
            TransportMode::Other("tram".to_string())
        );
        assert!("  ".parse::<TransportMode>().is_err());
    }

    #[test]
    fn travel_time_is_reported_in_minutes() {
        assert_eq!(CostKind::TravelTime.to_report_units(120.0), 2.0);
        assert_eq!(CostKind::Length.to_report_units(120.0), 120.0);
    }
}
