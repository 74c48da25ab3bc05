//! Service locations grouped by category

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use geo::{Centroid, Geometry, Point};
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Opaque identifier of a service, e.g. an OSM element id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(Arc<str>);

impl ServiceId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<u64> for ServiceId {
    fn from(value: u64) -> Self {
        Self::new(value.to_string())
    }
}

/// Named partition key for service sets ("healthcare", "food", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Category {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServicePoint {
    pub id: ServiceId,
    pub location: Point<f64>,
}

impl ServicePoint {
    pub fn new(id: impl Into<ServiceId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            location: Point::new(x, y),
        }
    }
}

/// Deduplicated point locations of one service category
#[derive(Debug, Clone)]
pub struct ServiceSet {
    category: Category,
    points: Vec<ServicePoint>,
}

impl ServiceSet {
    /// Builds the set, keeping the first occurrence of every id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if a location has non-finite coordinates.
    pub fn new(category: impl Into<Category>, points: Vec<ServicePoint>) -> Result<Self, Error> {
        let category = category.into();
        let received = points.len();
        let points: Vec<ServicePoint> = points.into_iter().unique_by(|p| p.id.clone()).collect();

        if let Some(bad) = points
            .iter()
            .find(|p| !p.location.x().is_finite() || !p.location.y().is_finite())
        {
            return Err(Error::InvalidData(format!(
                "service '{}' in category '{category}' has non-finite coordinates",
                bad.id
            )));
        }

        if points.len() < received {
            warn!(
                "Dropped {} duplicate services in category '{category}'",
                received - points.len()
            );
        }

        Ok(Self { category, points })
    }

    /// Reduces arbitrary geometries (building footprints, campuses, nodes)
    /// to their centroids before building the set.
    ///
    /// Geometries without a centroid (empty collections) are skipped.
    ///
    /// # Errors
    ///
    /// See [`ServiceSet::new`].
    pub fn from_geometries<I>(category: impl Into<Category>, features: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (ServiceId, Geometry<f64>)>,
    {
        let category = category.into();
        let points = features
            .into_iter()
            .filter_map(|(id, geometry)| match geometry.centroid() {
                Some(location) => Some(ServicePoint { id, location }),
                None => {
                    warn!(
                        "Service '{id}' in category '{category}' has an empty geometry, skipping"
                    );
                    None
                }
            })
            .collect();

        Self::new(category, points)
    }

    /// An empty set for a category with no services in the area
    pub fn empty(category: impl Into<Category>) -> Self {
        Self {
            category: category.into(),
            points: Vec::new(),
        }
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ServicePoint] {
        &self.points
    }

    pub fn get(&self, idx: usize) -> Option<&ServicePoint> {
        self.points.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServicePoint> {
        self.points.iter()
    }
}
