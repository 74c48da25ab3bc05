//! Serde adapter for distances and thresholds where `+inf` means
//! "unreachable" or "unbounded".
//!
//! JSON has no infinity, so `+inf` is written as `null` and `null` reads back
//! as `+inf`. Use with `#[serde(with = "reachgrid_core::metrics::infinity")]`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// # Errors
///
/// Propagates serializer errors.
#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if *value == f64::INFINITY {
        serializer.serialize_none()
    } else {
        Some(*value).serialize(serializer)
    }
}

/// # Errors
///
/// Fails for anything other than a number or `null`.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}
