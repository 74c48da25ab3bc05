use std::io::Read;
use std::path::PathBuf;

use log::info;
use serde::Deserialize;

use super::{deserialize_flag, open_file};
use crate::{Cost, Error, NodeId};
use crate::model::{CostKind, EdgeRecord, RoutableGraph, StreetNode, TransportMode};

/// Where to find the node and edge tables of one mode's street network
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkSource {
    pub mode: TransportMode,
    #[serde(default)]
    pub cost_kind: CostKind,
    /// CSV with `id,x,y` columns
    pub nodes: PathBuf,
    /// CSV with `from,to,cost[,oneway]` columns
    pub edges: PathBuf,
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: NodeId,
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    from: NodeId,
    to: NodeId,
    cost: Cost,
    #[serde(default, deserialize_with = "deserialize_flag")]
    oneway: bool,
}

/// Build a [`RoutableGraph`] from node and edge tables.
///
/// Edges are traversable in both directions unless flagged `oneway`.
///
/// # Errors
///
/// Returns [`Error::CsvError`] for malformed rows and [`Error::InvalidGraph`]
/// for inconsistent tables.
pub fn network_from_readers<N: Read, E: Read>(
    mode: TransportMode,
    cost_kind: CostKind,
    nodes: N,
    edges: E,
) -> Result<RoutableGraph, Error> {
    let nodes = csv::Reader::from_reader(nodes)
        .deserialize::<NodeRecord>()
        .map(|record| {
            record.map(|r| StreetNode {
                id: r.id,
                geometry: geo::Point::new(r.x, r.y),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut edges_out = Vec::new();
    for row in csv::Reader::from_reader(edges).deserialize::<EdgeRow>() {
        let row = row?;
        edges_out.push(EdgeRecord::new(row.from, row.to, row.cost));
        if !row.oneway {
            edges_out.push(EdgeRecord::new(row.to, row.from, row.cost));
        }
    }

    RoutableGraph::new(mode, cost_kind, nodes, edges_out)
}

/// # Errors
///
/// See [`network_from_readers`]; also fails if a file cannot be opened.
pub fn load_network_csv(source: &NetworkSource) -> Result<RoutableGraph, Error> {
    let graph = network_from_readers(
        source.mode.clone(),
        source.cost_kind,
        open_file(&source.nodes)?,
        open_file(&source.edges)?,
    )?;
    info!(
        "Loaded '{}' network from {} and {}",
        source.mode,
        source.nodes.display(),
        source.edges.display()
    );
    Ok(graph)
}
