//! Shortest-cost search over street networks

pub mod dijkstra;
pub mod service_field;
pub mod snapping;

pub use dijkstra::{NetworkDistanceField, Reached, SearchDirection};
pub use service_field::ServiceField;
pub use snapping::{snap_all, snap_to_node};
