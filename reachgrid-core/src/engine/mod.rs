//! Accessibility engine: bound data plus stateless queries over it.
//!
//! An [`EngineBuilder`] collects the population, service sets and street
//! networks; [`EngineBuilder::build`] validates them and yields a ready
//! [`AccessibilityEngine`]. The engine never mutates bound data. The only
//! state it carries is a set of memo caches for proximity indexes, network
//! service fields and population snapping, keyed by category and mode, so
//! that one construction serves every threshold.

mod config;
mod memo;
mod metric;

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashMap;
use log::{debug, info, warn};
use petgraph::graph::NodeIndex;
use serde::Serialize;

pub use config::{EngineConfig, LinearUnit};
pub use memo::Memo;
pub use metric::Metric;

use crate::Error;
use crate::algo::ProximityIndex;
use crate::metrics::{
    self, AnalysisUnit, CoverageStats, DistanceSummary, NearestResult, PerCapitaMetrics,
    UnitSummary,
};
use crate::model::{Category, RoutableGraph, ServiceSet, TransportMode, WeightedPointSet};
use crate::routing::{ServiceField, snap_all};

/// Immutable data an engine is bound to
#[derive(Debug)]
pub struct BoundData {
    pub config: EngineConfig,
    pub population: WeightedPointSet,
    pub services: BTreeMap<Category, ServiceSet>,
    pub networks: HashMap<TransportMode, RoutableGraph>,
}

/// Collects inputs for an [`AccessibilityEngine`]
#[derive(Debug, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    population: Option<WeightedPointSet>,
    services: BTreeMap<Category, ServiceSet>,
    networks: HashMap<TransportMode, RoutableGraph>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn population(mut self, population: WeightedPointSet) -> Self {
        self.population = Some(population);
        self
    }

    /// Bind a service set under its own category, replacing any previous one
    #[must_use]
    pub fn services(mut self, services: ServiceSet) -> Self {
        let category = services.category().clone();
        if self.services.insert(category.clone(), services).is_some() {
            warn!("Replacing previously bound services for category '{category}'");
        }
        self
    }

    /// Bind a street network under its own mode, replacing any previous one
    #[must_use]
    pub fn network(mut self, graph: RoutableGraph) -> Self {
        let mode = graph.mode().clone();
        if self.networks.insert(mode.clone(), graph).is_some() {
            warn!("Replacing previously bound '{mode}' network");
        }
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::NotReady`] without a population and
    /// [`Error::InvalidData`] for an invalid configuration or a network bound
    /// under a mode the configuration does not declare.
    pub fn build(self) -> Result<AccessibilityEngine, Error> {
        let population = self.population.ok_or(Error::NotReady("population is not bound"))?;
        self.config.validate()?;

        if let Some(mode) = self.networks.keys().find(|m| !self.config.modes.contains(m)) {
            return Err(Error::InvalidData(format!(
                "a '{mode}' network is bound but the mode is not declared"
            )));
        }
        if self.config.linear_unit == LinearUnit::Degree {
            warn!(
                "Inputs use geographic coordinates (degrees); Euclidean distances will be \
                 very inaccurate. Project the data to a metric CRS first."
            );
        }
        for mode in &self.config.modes {
            if !self.networks.contains_key(mode) {
                debug!("Mode '{mode}' is declared but no network is bound for it");
            }
        }

        info!(
            "Accessibility engine ready: {} population points ({:.1} people), {} service categories, {} networks",
            population.len(),
            population.total_weight(),
            self.services.len(),
            self.networks.len()
        );

        Ok(AccessibilityEngine {
            data: Arc::new(BoundData {
                config: self.config,
                population,
                services: self.services,
                networks: self.networks,
            }),
            caches: Arc::new(Caches::default()),
        })
    }
}

#[derive(Debug, Default)]
struct Caches {
    proximity: Memo<Category, ProximityIndex>,
    service_fields: Memo<(Category, TransportMode), ServiceField>,
    snapped_population: Memo<TransportMode, Vec<Option<NodeIndex>>>,
}

/// Nearest distances and coverage for one (category, metric, threshold) query
#[derive(Debug, Clone, Serialize)]
pub struct AccessibilityReport {
    pub category: Category,
    pub metric: Metric,
    #[serde(with = "crate::metrics::infinity")]
    pub threshold: f64,
    pub nearest: Vec<NearestResult>,
    pub coverage: CoverageStats,
    pub summary: DistanceSummary,
}

/// Ready engine. Cheap to clone; clones share bound data and caches and may
/// be queried from any number of threads.
#[derive(Debug, Clone)]
pub struct AccessibilityEngine {
    data: Arc<BoundData>,
    caches: Arc<Caches>,
}

impl AccessibilityEngine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.data.config
    }

    pub fn population(&self) -> &WeightedPointSet {
        &self.data.population
    }

    /// Bound categories in lexical order
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.data.services.keys()
    }

    /// Declared transport modes
    pub fn modes(&self) -> &[TransportMode] {
        &self.data.config.modes
    }

    pub fn network(&self, mode: &TransportMode) -> Option<&RoutableGraph> {
        self.data.networks.get(mode)
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownCategory`] if nothing is bound under `category`.
    pub fn services(&self, category: &str) -> Result<&ServiceSet, Error> {
        self.data
            .services
            .get(category)
            .ok_or_else(|| Error::UnknownCategory {
                category: category.to_string(),
                available: self.data.services.keys().map(ToString::to_string).collect(),
            })
    }

    /// Resolve a metric name (`euclidean` or a declared mode)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetric`] for anything else.
    pub fn resolve_metric(&self, name: &str) -> Result<Metric, Error> {
        Metric::parse(name, &self.data.config.modes)
    }

    fn network_for(&self, metric: &Metric) -> Result<Option<&RoutableGraph>, Error> {
        let Some(mode) = metric.mode() else {
            return Ok(None);
        };
        if !self.data.config.modes.contains(mode) {
            return Err(Error::InvalidMetric {
                metric: mode.to_string(),
                expected: std::iter::once(Metric::EUCLIDEAN.to_string())
                    .chain(self.data.config.modes.iter().map(ToString::to_string))
                    .collect(),
            });
        }
        self.data
            .networks
            .get(mode)
            .map(Some)
            .ok_or_else(|| Error::MissingNetwork(mode.clone()))
    }

    fn proximity_index(&self, services: &ServiceSet) -> Result<Arc<ProximityIndex>, Error> {
        self.caches
            .proximity
            .get_or_try_build(services.category(), || ProximityIndex::build(services))
    }

    fn service_field(
        &self,
        services: &ServiceSet,
        graph: &RoutableGraph,
    ) -> Result<Arc<ServiceField>, Error> {
        let key = (services.category().clone(), graph.mode().clone());
        self.caches.service_fields.get_or_try_build(&key, || {
            let field = ServiceField::build(graph, services, self.data.config.max_snap_distance)?;
            debug!(
                "Routing '{}' from {} of {} services on the '{}' network",
                services.category(),
                field.snapped_services(),
                services.len(),
                graph.mode()
            );
            Ok(field)
        })
    }

    fn snapped_population(&self, graph: &RoutableGraph) -> Arc<Vec<Option<NodeIndex>>> {
        let built = self
            .caches
            .snapped_population
            .get_or_try_build(graph.mode(), || {
                let locations: Vec<_> = self.data.population.iter().map(|p| p.location).collect();
                let snapped = snap_all(graph, &locations, self.data.config.max_snap_distance);
                let unsnapped = snapped.iter().filter(|n| n.is_none()).count();
                if unsnapped > 0 {
                    warn!(
                        "{unsnapped} of {} population points could not be snapped to the '{}' network",
                        snapped.len(),
                        graph.mode()
                    );
                }
                Ok::<_, std::convert::Infallible>(snapped)
            });
        match built {
            Ok(snapped) => snapped,
            Err(never) => match never {},
        }
    }

    /// Nearest service per population point under `metric`
    ///
    /// # Errors
    ///
    /// [`Error::UnknownCategory`], [`Error::InvalidMetric`],
    /// [`Error::MissingNetwork`], or [`Error::EmptyIndex`] when the category
    /// has no services.
    pub fn nearest(&self, category: &str, metric: &Metric) -> Result<Vec<NearestResult>, Error> {
        let services = self.services(category)?;
        let graph = self.network_for(metric)?;
        if services.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let results = match graph {
            None => {
                let index = self.proximity_index(services)?;
                metrics::euclidean_nearest(&self.data.population, &index)
            }
            Some(graph) => {
                let field = self.service_field(services, graph)?;
                let snapped = self.snapped_population(graph);
                metrics::network_nearest(&snapped, &field, services)
            }
        };

        debug!(
            "Computed {metric} nearest distances for {} points to '{category}'",
            results.len()
        );
        Ok(results)
    }

    /// Nearest distances plus coverage within `threshold`.
    ///
    /// Thresholds are in the CRS linear unit for Euclidean queries, in
    /// minutes for travel-time networks and in the linear unit for length
    /// networks.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidThreshold`] and everything [`AccessibilityEngine::nearest`]
    /// returns.
    pub fn calculate_accessibility_metrics(
        &self,
        category: &str,
        threshold: f64,
        metric: &Metric,
    ) -> Result<AccessibilityReport, Error> {
        metrics::validate_threshold(threshold)?;
        let nearest = self.nearest(category, metric)?;
        let coverage = metrics::calculate_coverage(&self.data.population, &nearest, threshold)?;
        let summary = metrics::summarize_distances(&self.data.population, &nearest);

        if coverage.degenerate {
            warn!("Total population is zero; coverage for '{category}' is degenerate");
        }

        Ok(AccessibilityReport {
            category: Category::new(category),
            metric: metric.clone(),
            threshold,
            nearest,
            coverage,
            summary,
        })
    }

    /// Coverage at each of `thresholds` from one nearest-distance pass
    ///
    /// # Errors
    ///
    /// See [`AccessibilityEngine::calculate_accessibility_metrics`].
    pub fn coverage_curve(
        &self,
        category: &str,
        metric: &Metric,
        thresholds: &[f64],
    ) -> Result<Vec<CoverageStats>, Error> {
        for &threshold in thresholds {
            metrics::validate_threshold(threshold)?;
        }
        let nearest = self.nearest(category, metric)?;
        metrics::coverage_curve(&self.data.population, &nearest, thresholds)
    }

    /// Services per 1000 people and people per service for `category`
    ///
    /// # Errors
    ///
    /// [`Error::UnknownCategory`], [`Error::ZeroPopulation`] or
    /// [`Error::ZeroService`].
    pub fn calculate_per_capita_metrics(&self, category: &str) -> Result<PerCapitaMetrics, Error> {
        let services = self.services(category)?;
        metrics::calculate_per_capita(&self.data.population, services)
    }

    /// Per-unit population, service count and coverage
    ///
    /// # Errors
    ///
    /// See [`AccessibilityEngine::calculate_accessibility_metrics`].
    pub fn summarize_units(
        &self,
        units: &[AnalysisUnit],
        category: &str,
        threshold: f64,
        metric: &Metric,
    ) -> Result<Vec<UnitSummary>, Error> {
        metrics::validate_threshold(threshold)?;
        let services = self.services(category)?;
        let nearest = self.nearest(category, metric)?;
        metrics::summarize_units(units, &self.data.population, &nearest, services, threshold)
    }

    /// Number of index constructions performed so far, across all caches
    pub fn index_builds(&self) -> usize {
        self.caches.proximity.builds()
            + self.caches.service_fields.builds()
            + self.caches.snapped_population.builds()
    }
}
