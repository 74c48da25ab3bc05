use serde::{Deserialize, Serialize};

use crate::Error;
use crate::model::TransportMode;

/// Linear unit of the projected CRS all inputs share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearUnit {
    #[default]
    Metre,
    Foot,
    /// Geographic coordinates; Euclidean distances are not meaningful
    Degree,
}

/// Configuration accepted when binding data to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Transport modes network metrics may be requested for
    pub modes: Vec<TransportMode>,
    pub linear_unit: LinearUnit,
    /// Points farther than this from any graph node are unreachable
    pub max_snap_distance: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            modes: vec![TransportMode::Walk, TransportMode::Bike, TransportMode::Drive],
            linear_unit: LinearUnit::Metre,
            max_snap_distance: None,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] for duplicate modes or a negative or
    /// non-finite snap limit.
    pub fn validate(&self) -> Result<(), Error> {
        for (i, mode) in self.modes.iter().enumerate() {
            if self.modes[..i].contains(mode) {
                return Err(Error::InvalidData(format!("mode '{mode}' declared twice")));
            }
        }
        if let Some(limit) = self.max_snap_distance {
            if !limit.is_finite() || limit < 0.0 {
                return Err(Error::InvalidData(format!("invalid max_snap_distance {limit}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_declares_standard_modes() {
        let config = EngineConfig::default();
        assert_eq!(config.modes.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duplicate_mode_is_invalid() {
        let config = EngineConfig {
            modes: vec![TransportMode::Walk, TransportMode::Walk],
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_snap_limit_is_invalid() {
        let config = EngineConfig {
            max_snap_distance: Some(-1.0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"modes": ["walk", "tram"], "linear_unit": "foot"}"#).unwrap();

        assert_eq!(
            config.modes,
            vec![TransportMode::Walk, TransportMode::Other("tram".to_string())]
        );
        assert_eq!(config.linear_unit, LinearUnit::Foot);
        assert_eq!(config.max_snap_distance, None);
    }
}
