//! Nearest-neighbour lookup over projected point sets.
//!
//! Both the service proximity index and graph node snapping go through
//! [`PointIndex`], a bulk-loaded R*-tree keyed by planar coordinates.
//! Distances are Euclidean in the linear unit of the projected CRS.

use geo::{Point, Rect};
use log::debug;
use rstar::{AABB, RTree};
use rstar::primitives::GeomWithData;

use crate::Error;
use crate::model::{ServiceId, ServiceSet};

pub type IndexedPoint<T> = GeomWithData<[f64; 2], T>;

/// Immutable R*-tree over points carrying a payload
#[derive(Debug, Clone)]
pub struct PointIndex<T> {
    tree: RTree<IndexedPoint<T>>,
}

impl<T> PointIndex<T> {
    /// Bulk loads a balanced tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyIndex`] when `items` is empty.
    pub fn bulk_load(items: Vec<(Point<f64>, T)>) -> Result<Self, Error> {
        if items.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let items = items
            .into_iter()
            .map(|(point, data)| GeomWithData::new([point.x(), point.y()], data))
            .collect();

        Ok(Self {
            tree: RTree::bulk_load(items),
        })
    }

    /// Closest indexed point and its Euclidean distance to `location`
    pub fn nearest(&self, location: &Point<f64>) -> Option<(f64, &T)> {
        let query = [location.x(), location.y()];
        self.tree.nearest_neighbor(&query).map(|item| {
            let [x, y] = *item.geom();
            ((x - query[0]).hypot(y - query[1]), &item.data)
        })
    }

    /// Indexed points inside `rect`, boundary included
    pub fn in_rect(&self, rect: &Rect<f64>) -> Vec<(Point<f64>, &T)> {
        let envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|item| {
                let [x, y] = *item.geom();
                (Point::new(x, y), &item.data)
            })
            .collect()
    }
}

/// Spatial index over one [`ServiceSet`]
#[derive(Debug, Clone)]
pub struct ProximityIndex {
    index: PointIndex<usize>,
    ids: Vec<ServiceId>,
}

/// Result of a proximity lookup
#[derive(Debug, Clone, PartialEq)]
pub struct NearestService<'a> {
    pub distance: f64,
    /// Position of the service in its [`ServiceSet`]
    pub slot: usize,
    pub id: &'a ServiceId,
}

impl ProximityIndex {
    /// # Errors
    ///
    /// Returns [`Error::EmptyIndex`] for an empty service set. Callers are
    /// expected to check cardinality first.
    pub fn build(services: &ServiceSet) -> Result<Self, Error> {
        let index = PointIndex::bulk_load(
            services
                .iter()
                .enumerate()
                .map(|(slot, service)| (service.location, slot))
                .collect(),
        )?;
        let ids = services.iter().map(|s| s.id.clone()).collect();

        debug!(
            "Built proximity index over {} services of category '{}'",
            services.len(),
            services.category()
        );
        Ok(Self { index, ids })
    }

    /// Nearest service to `location`. `None` only if the index is empty,
    /// which [`ProximityIndex::build`] rules out.
    pub fn nearest(&self, location: &Point<f64>) -> Option<NearestService<'_>> {
        self.index
            .nearest(location)
            .map(|(distance, &slot)| NearestService {
                distance,
                slot,
                id: &self.ids[slot],
            })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
