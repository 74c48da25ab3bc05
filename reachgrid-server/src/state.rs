use reachgrid_core::engine::{AccessibilityEngine, EngineBuilder};
use reachgrid_core::loading::{load_network_csv, load_population_csv, load_services_geojson};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::StartupError;

/// Shared handler state; cloning shares the engine and its caches
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: AccessibilityEngine,
}

impl AppState {
    pub fn new(engine: AccessibilityEngine) -> Self {
        Self { engine }
    }

    /// Load every configured input and bind it to a fresh engine
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Core`] for unreadable or invalid data files.
    pub fn load(config: &ServerConfig) -> Result<Self, StartupError> {
        let mut builder = EngineBuilder::new(config.engine.clone())
            .population(load_population_csv(&config.data.population)?);

        for source in &config.data.services {
            builder = builder.services(load_services_geojson(
                source.category.clone(),
                &source.path,
            )?);
        }
        for network in &config.data.networks {
            builder = builder.network(load_network_csv(network)?);
        }

        let engine = builder.build()?;
        info!(
            categories = engine.categories().count(),
            population_points = engine.population().len(),
            "engine bound"
        );
        Ok(Self::new(engine))
    }
}
