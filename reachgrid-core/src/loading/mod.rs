//! Readers for the files a data collaborator hands over: population points,
//! service features and street networks, all already projected to one CRS.

mod network;
mod population;
mod services;

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

pub use network::{NetworkSource, load_network_csv, network_from_readers};
pub use population::{load_population_csv, population_from_reader};
pub use services::{load_services_geojson, services_from_geojson_str};

fn open_file(path: &Path) -> Result<File, std::io::Error> {
    File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })
}

/// Lenient boolean column: `true/false`, `yes/no`, `1/0`; empty is false
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "f" | "n" => Ok(false),
        "1" | "true" | "yes" | "t" | "y" => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean flag, got '{other}'"
        ))),
    }
}
