//! TOML configuration of the reporting service

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reachgrid_core::engine::EngineConfig;
use reachgrid_core::loading::NetworkSource;
use reachgrid_core::model::Category;
use serde::Deserialize;

use crate::error::StartupError;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub engine: EngineConfig,
    pub data: DataSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
    /// Maximum number of analysis requests processed at once
    pub concurrency_limit: usize,
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            concurrency_limit: 4,
            request_timeout_secs: 120,
        }
    }
}

impl ServerSection {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
    /// CSV with `x,y,population` columns
    pub population: PathBuf,
    #[serde(default)]
    pub services: Vec<ServiceSource>,
    #[serde(default)]
    pub networks: Vec<NetworkSource>,
}

/// GeoJSON features of one service category
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSource {
    pub category: Category,
    pub path: PathBuf,
}

impl ServerConfig {
    /// # Errors
    ///
    /// Returns [`StartupError::Config`] for invalid TOML or a zero
    /// concurrency limit.
    pub fn from_toml_str(text: &str) -> Result<Self, StartupError> {
        let config: Self = toml::from_str(text)?;
        if config.server.concurrency_limit == 0 {
            return Err(StartupError::Invalid(
                "server.concurrency_limit must be at least 1".to_string(),
            ));
        }
        config.engine.validate()?;
        Ok(config)
    }

    /// Read the file and resolve relative data paths against its directory
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_toml_str`]; also fails if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let text = std::fs::read_to_string(path).map_err(|source| StartupError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.data.resolve_paths_from(path.parent());
        Ok(config)
    }
}

impl DataSection {
    fn resolve_paths_from(&mut self, base: Option<&Path>) {
        let Some(base) = base else { return };
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.population);
        for source in &mut self.services {
            resolve(&mut source.path);
        }
        for network in &mut self.networks {
            resolve(&mut network.nodes);
            resolve(&mut network.edges);
        }
    }
}
