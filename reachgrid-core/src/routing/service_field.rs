//! Network cost from every street node to the nearest service of a category

use log::{debug, warn};
use petgraph::graph::NodeIndex;

use super::dijkstra::{NetworkDistanceField, SearchDirection};
use super::snapping::snap_all;
use crate::Error;
use crate::model::{CostKind, RoutableGraph, ServiceSet};

/// [`NetworkDistanceField`] seeded from the snapped locations of a
/// [`ServiceSet`], searched against edge direction so that costs measure
/// travel from a node towards the services.
#[derive(Debug, Clone)]
pub struct ServiceField {
    field: NetworkDistanceField,
    /// Service slot for every source handed to the search
    source_slots: Vec<usize>,
    cost_kind: CostKind,
}

impl ServiceField {
    /// # Errors
    ///
    /// Returns [`Error::EmptyIndex`] for an empty service set.
    pub fn build(
        graph: &RoutableGraph,
        services: &ServiceSet,
        max_snap_distance: Option<f64>,
    ) -> Result<Self, Error> {
        if services.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let locations: Vec<_> = services.iter().map(|s| s.location).collect();
        let snapped = snap_all(graph, &locations, max_snap_distance);

        let (source_slots, sources): (Vec<usize>, Vec<NodeIndex>) = snapped
            .into_iter()
            .enumerate()
            .filter_map(|(slot, node)| node.map(|n| (slot, n)))
            .unzip();

        if sources.len() < services.len() {
            warn!(
                "{} of {} '{}' services could not be snapped to the '{}' network",
                services.len() - sources.len(),
                services.len(),
                services.category(),
                graph.mode()
            );
        }

        let field = NetworkDistanceField::compute(graph, &sources, SearchDirection::Inbound)?;
        debug!(
            "Service field for '{}' on '{}' reaches {} of {} nodes",
            services.category(),
            graph.mode(),
            field.len(),
            graph.node_count()
        );

        Ok(Self {
            field,
            source_slots,
            cost_kind: graph.cost_kind(),
        })
    }

    /// Cost in report units from `node` to its nearest service, with that
    /// service's slot. `None` when no service is reachable.
    pub fn nearest(&self, node: NodeIndex) -> Option<(f64, usize)> {
        self.field.get(node).map(|reached| {
            (
                self.cost_kind.to_report_units(reached.cost),
                self.source_slots[reached.origin],
            )
        })
    }

    /// Number of services that made it onto the network
    pub fn snapped_services(&self) -> usize {
        self.source_slots.len()
    }
}
