use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use log::trace;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use super::state::State;
use crate::{Cost, Error};
use crate::model::RoutableGraph;

/// Which way edges are followed from the sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    /// Cost of travelling from the sources to each node
    #[default]
    Outbound,
    /// Cost of travelling from each node to the sources (edges reversed)
    Inbound,
}

impl SearchDirection {
    fn petgraph(self) -> Direction {
        match self {
            SearchDirection::Outbound => Direction::Outgoing,
            SearchDirection::Inbound => Direction::Incoming,
        }
    }
}

/// Best cost at which a node was reached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reached {
    pub cost: Cost,
    /// Position in the source list of the source this cost comes from.
    /// Arbitrary among equally distant sources.
    pub origin: usize,
}

/// Cost from the nearest of a set of source nodes to every reachable node.
///
/// Nodes that cannot be reached are absent and have implicitly infinite cost.
#[derive(Debug, Clone, Default)]
pub struct NetworkDistanceField {
    reached: HashMap<NodeIndex, Reached>,
}

impl NetworkDistanceField {
    /// Multi-source Dijkstra: every source starts at cost 0 and a single
    /// priority-driven relaxation pass expands outward from all of them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIndex`] if a source is not a node of `graph`.
    /// Negative edge costs are rejected when the graph is built.
    pub fn compute(
        graph: &RoutableGraph,
        sources: &[NodeIndex],
        direction: SearchDirection,
    ) -> Result<Self, Error> {
        if let Some(bad) = sources.iter().find(|&&s| !graph.contains(s)) {
            trace!("Source node {} is not part of the graph", bad.index());
            return Err(Error::InvalidNodeIndex);
        }

        let node_count = graph.node_count();
        let mut reached: HashMap<NodeIndex, Reached> = HashMap::with_capacity(node_count);
        let mut settled = FixedBitSet::with_capacity(node_count);
        let mut heap = BinaryHeap::with_capacity(sources.len().max(16));

        // All sources start at zero; a node listed twice keeps its first origin
        for (origin, &node) in sources.iter().enumerate() {
            if let hashbrown::hash_map::Entry::Vacant(entry) = reached.entry(node) {
                entry.insert(Reached { cost: 0.0, origin });
                heap.push(State {
                    cost: 0.0,
                    node,
                    origin,
                });
            }
        }

        let edge_direction = direction.petgraph();
        while let Some(State { cost, node, origin }) = heap.pop() {
            if settled.contains(node.index()) {
                continue;
            }
            // Skip if we've found a better path
            if let Some(best) = reached.get(&node) {
                if cost > best.cost {
                    continue;
                }
            }
            settled.insert(node.index());

            for edge in graph.edges_directed(node, edge_direction) {
                let next = match direction {
                    SearchDirection::Outbound => edge.target(),
                    SearchDirection::Inbound => edge.source(),
                };
                if settled.contains(next.index()) {
                    continue;
                }
                let next_cost = cost + edge.weight().cost;

                match reached.entry(next) {
                    hashbrown::hash_map::Entry::Vacant(entry) => {
                        entry.insert(Reached {
                            cost: next_cost,
                            origin,
                        });
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                            origin,
                        });
                    }
                    hashbrown::hash_map::Entry::Occupied(mut entry) => {
                        if next_cost < entry.get().cost {
                            *entry.get_mut() = Reached {
                                cost: next_cost,
                                origin,
                            };
                            heap.push(State {
                                cost: next_cost,
                                node: next,
                                origin,
                            });
                        }
                    }
                }
            }
        }

        trace!(
            "Multi-source search from {} sources reached {} of {node_count} nodes",
            sources.len(),
            reached.len()
        );

        Ok(Self { reached })
    }

    pub fn get(&self, node: NodeIndex) -> Option<Reached> {
        self.reached.get(&node).copied()
    }

    /// Cost to `node`, `None` if unreachable
    pub fn cost(&self, node: NodeIndex) -> Option<Cost> {
        self.reached.get(&node).map(|r| r.cost)
    }

    /// Number of reached nodes
    pub fn len(&self) -> usize {
        self.reached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reached.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeId;
    use crate::model::{CostKind, EdgeRecord, StreetNode, TransportMode};
    use geo::Point;
    use proptest::prelude::*;

    fn graph(node_count: u64, edges: &[(NodeId, NodeId, f64)]) -> RoutableGraph {
        let nodes = (0..node_count)
            .map(|id| StreetNode {
                id,
                geometry: Point::new(id as f64, 0.0),
            })
            .collect();
        let edges = edges
            .iter()
            .map(|&(from, to, cost)| EdgeRecord::new(from, to, cost))
            .collect();
        RoutableGraph::new(TransportMode::Walk, CostKind::Length, nodes, edges).unwrap()
    }

    fn idx(graph: &RoutableGraph, id: NodeId) -> NodeIndex {
        graph.node_index(id).unwrap()
    }

    /// Bellman-Ford relaxation from all sources at once
    fn reference(
        node_count: usize,
        edges: &[(NodeId, NodeId, f64)],
        sources: &[NodeId],
    ) -> Vec<f64> {
        let mut dist = vec![f64::INFINITY; node_count];
        for &s in sources {
            dist[s as usize] = 0.0;
        }
        for _ in 0..node_count {
            for &(from, to, cost) in edges {
                let candidate = dist[from as usize] + cost;
                if candidate < dist[to as usize] {
                    dist[to as usize] = candidate;
                }
            }
        }
        dist
    }

    #[test]
    fn nearest_of_several_sources_wins() {
        // 0 -5-> 1 -5-> 2 <-1- 3
        let g = graph(4, &[(0, 1, 5.0), (1, 2, 5.0), (3, 2, 1.0)]);
        let field = NetworkDistanceField::compute(
            &g,
            &[idx(&g, 0), idx(&g, 3)],
            SearchDirection::Outbound,
        )
        .unwrap();

        assert_eq!(field.cost(idx(&g, 1)), Some(5.0));
        assert_eq!(field.get(idx(&g, 2)), Some(Reached { cost: 1.0, origin: 1 }));
        assert_eq!(field.cost(idx(&g, 3)), Some(0.0));
        assert_eq!(field.len(), 4);
    }

    #[test]
    fn inbound_follows_edges_backwards() {
        // one-way street 0 -> 1; service sits at node 1
        let g = graph(2, &[(0, 1, 7.0)]);
        let inbound =
            NetworkDistanceField::compute(&g, &[idx(&g, 1)], SearchDirection::Inbound).unwrap();
        let outbound =
            NetworkDistanceField::compute(&g, &[idx(&g, 1)], SearchDirection::Outbound).unwrap();

        assert_eq!(inbound.cost(idx(&g, 0)), Some(7.0));
        assert_eq!(outbound.cost(idx(&g, 0)), None);
    }

    #[test]
    fn disconnected_component_is_absent() {
        let g = graph(4, &[(0, 1, 1.0), (1, 0, 1.0), (2, 3, 1.0), (3, 2, 1.0)]);
        let field =
            NetworkDistanceField::compute(&g, &[idx(&g, 0)], SearchDirection::Outbound).unwrap();

        assert!(field.cost(idx(&g, 2)).is_none());
        assert!(field.cost(idx(&g, 3)).is_none());
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn zero_cost_edges_are_allowed() {
        let g = graph(3, &[(0, 1, 0.0), (1, 2, 0.0)]);
        let field =
            NetworkDistanceField::compute(&g, &[idx(&g, 0)], SearchDirection::Outbound).unwrap();
        assert_eq!(field.cost(idx(&g, 2)), Some(0.0));
    }

    #[test]
    fn no_sources_reaches_nothing() {
        let g = graph(3, &[(0, 1, 1.0)]);
        let field = NetworkDistanceField::compute(&g, &[], SearchDirection::Outbound).unwrap();
        assert!(field.is_empty());
    }

    #[test]
    fn foreign_source_is_rejected() {
        let g = graph(2, &[(0, 1, 1.0)]);
        let result =
            NetworkDistanceField::compute(&g, &[NodeIndex::new(42)], SearchDirection::Outbound);
        assert!(matches!(result, Err(Error::InvalidNodeIndex)));
    }

    fn arb_graph() -> impl Strategy<Value = (usize, Vec<(NodeId, NodeId, f64)>, Vec<NodeId>)> {
        (2usize..12).prop_flat_map(|n| {
            let node = 0..n as u64;
            (
                Just(n),
                prop::collection::vec((node.clone(), node.clone(), 0.0f64..100.0), 0..40),
                prop::collection::vec(node, 1..4),
            )
        })
    }

    proptest! {
        #[test]
        fn matches_reference_relaxation((n, edges, sources) in arb_graph()) {
            let g = graph(n as u64, &edges);
            let source_idx: Vec<NodeIndex> = sources.iter().map(|&s| idx(&g, s)).collect();
            let field =
                NetworkDistanceField::compute(&g, &source_idx, SearchDirection::Outbound).unwrap();
            let expected = reference(n, &edges, &sources);

            for id in 0..n as u64 {
                match field.cost(idx(&g, id)) {
                    Some(cost) => prop_assert!((cost - expected[id as usize]).abs() < 1e-9),
                    None => prop_assert!(expected[id as usize].is_infinite()),
                }
            }
        }
    }
}
