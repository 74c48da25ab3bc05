use std::fmt;

use serde::{Serialize, Serializer};

use crate::Error;
use crate::model::TransportMode;

/// Distance metric a query is evaluated under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Straight-line distance in the CRS linear unit
    Euclidean,
    /// Shortest network cost on the street graph bound for the mode
    Network(TransportMode),
}

impl Metric {
    pub const EUCLIDEAN: &'static str = "euclidean";

    /// Resolve a metric name against the declared transport modes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetric`] when `name` is neither `euclidean`
    /// nor one of `modes`.
    pub fn parse(name: &str, modes: &[TransportMode]) -> Result<Self, Error> {
        let invalid = || Error::InvalidMetric {
            metric: name.to_string(),
            expected: std::iter::once(Self::EUCLIDEAN.to_string())
                .chain(modes.iter().map(ToString::to_string))
                .collect(),
        };

        if name.trim().eq_ignore_ascii_case(Self::EUCLIDEAN) {
            return Ok(Metric::Euclidean);
        }
        let mode: TransportMode = name.parse().map_err(|_| invalid())?;
        if modes.contains(&mode) {
            Ok(Metric::Network(mode))
        } else {
            Err(invalid())
        }
    }

    pub fn mode(&self) -> Option<&TransportMode> {
        match self {
            Metric::Euclidean => None,
            Metric::Network(mode) => Some(mode),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Euclidean => f.write_str(Self::EUCLIDEAN),
            Metric::Network(mode) => write!(f, "{mode}"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declared_names() {
        let modes = [TransportMode::Walk, TransportMode::Drive];
        assert_eq!(Metric::parse("euclidean", &modes).unwrap(), Metric::Euclidean);
        assert_eq!(Metric::parse("EUCLIDEAN", &modes).unwrap(), Metric::Euclidean);
        assert_eq!(
            Metric::parse("drive", &modes).unwrap(),
            Metric::Network(TransportMode::Drive)
        );
    }

    #[test]
    fn undeclared_mode_is_invalid() {
        let err = Metric::parse("bike", &[TransportMode::Walk]).unwrap_err();
        match err {
            Error::InvalidMetric { metric, expected } => {
                assert_eq!(metric, "bike");
                assert_eq!(expected, vec!["euclidean".to_string(), "walk".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(Metric::parse("", &[TransportMode::Walk]).is_err());
    }

    #[test]
    fn displays_as_name() {
        assert_eq!(Metric::Network(TransportMode::Bike).to_string(), "bike");
        assert_eq!(
            serde_json::to_string(&Metric::Euclidean).unwrap(),
            "\"euclidean\""
        );
    }
}
