mod multi_source;
mod state;

pub use multi_source::{NetworkDistanceField, Reached, SearchDirection};
