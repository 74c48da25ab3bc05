use std::cmp::Ordering;

use petgraph::graph::NodeIndex;

use crate::Cost;

#[derive(Copy, Clone, Debug)]
pub(super) struct State {
    pub(super) cost: Cost,
    pub(super) node: NodeIndex,
    /// Position of the seeding source in the caller's source list
    pub(super) origin: usize,
}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}
