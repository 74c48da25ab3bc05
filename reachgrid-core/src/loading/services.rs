use std::path::Path;

use geo::Geometry;
use geojson::{Feature, GeoJson, feature::Id};
use log::{info, warn};
use serde_json::Value;

use crate::Error;
use crate::model::{Category, ServiceId, ServiceSet};

/// Feature id, then an `id` property, then `#<position>`. Positional ids
/// carry the `#` prefix so they never collide with explicit numeric ids.
fn feature_id(feature: &Feature, position: usize) -> ServiceId {
    match &feature.id {
        Some(Id::String(id)) => return ServiceId::from(id.as_str()),
        Some(Id::Number(id)) => return ServiceId::from(id.to_string()),
        None => {}
    }
    match feature.property("id") {
        Some(Value::String(id)) => ServiceId::from(id.as_str()),
        Some(Value::Number(id)) => ServiceId::from(id.to_string()),
        _ => ServiceId::from(format!("#{position}")),
    }
}

/// Parse a `FeatureCollection` (or a single `Feature`) into a service set.
///
/// Features without geometry, or whose geometry cannot be converted, are
/// skipped with a warning. Polygons and lines are reduced to centroids.
///
/// # Errors
///
/// Returns [`Error::GeoJsonError`] for invalid GeoJSON or a bare geometry
/// document, and [`Error::InvalidData`] for non-finite coordinates.
pub fn services_from_geojson_str(
    category: impl Into<Category>,
    text: &str,
) -> Result<ServiceSet, Error> {
    let category = category.into();
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| Error::GeoJsonError(e.to_string()))?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(Error::GeoJsonError(
                "expected a Feature or FeatureCollection, got a bare geometry".to_string(),
            ));
        }
    };

    let mut geometries = Vec::with_capacity(features.len());
    for (position, feature) in features.into_iter().enumerate() {
        let id = feature_id(&feature, position);
        let Some(geometry) = feature.geometry else {
            warn!("Service '{id}' in category '{category}' has no geometry, skipping");
            continue;
        };
        match Geometry::<f64>::try_from(geometry) {
            Ok(geometry) => geometries.push((id, geometry)),
            Err(e) => {
                warn!("Service '{id}' in category '{category}' has an unusable geometry: {e}");
            }
        }
    }

    ServiceSet::from_geometries(category, geometries)
}

/// # Errors
///
/// See [`services_from_geojson_str`]; also fails if the file cannot be read.
pub fn load_services_geojson(
    category: impl Into<Category>,
    path: &Path,
) -> Result<ServiceSet, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to read file '{}': {}", path.display(), e),
        )
    })?;
    let services = services_from_geojson_str(category, &text)?;
    info!(
        "Loaded {} '{}' services from {}",
        services.len(),
        services.category(),
        path.display()
    );
    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "n1",
             "geometry": {"type": "Point", "coordinates": [10.0, 20.0]},
             "properties": {"amenity": "clinic"}},
            {"type": "Feature",
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[4,0],[4,2],[0,2],[0,0]]]},
             "properties": {"id": 77}},
            {"type": "Feature", "geometry": null, "properties": {}},
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [1.0, 1.0]},
             "properties": null}
        ]
    }"#;

    #[test]
    fn ids_and_centroids() {
        let services = services_from_geojson_str("healthcare", COLLECTION).unwrap();

        assert_eq!(services.len(), 3);
        assert_eq!(services.points()[0].id.as_str(), "n1");
        assert_eq!(services.points()[0].location, Point::new(10.0, 20.0));
        assert_eq!(services.points()[1].id.as_str(), "77");
        assert_eq!(services.points()[1].location, Point::new(2.0, 1.0));
        assert_eq!(services.points()[2].id.as_str(), "#3");
    }

    #[test]
    fn positional_ids_do_not_shadow_explicit_ones() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                 "properties": {"id": 1}},
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [500.0, 500.0]},
                 "properties": {}}
            ]
        }"#;
        let services = services_from_geojson_str("healthcare", text).unwrap();

        assert_eq!(services.len(), 2);
        assert_eq!(services.points()[0].id.as_str(), "1");
        assert_eq!(services.points()[1].id.as_str(), "#1");
        assert_eq!(services.points()[1].location, Point::new(500.0, 500.0));
    }

    #[test]
    fn bare_geometry_is_rejected() {
        let result =
            services_from_geojson_str("food", r#"{"type": "Point", "coordinates": [0, 0]}"#);
        assert!(matches!(result, Err(Error::GeoJsonError(_))));
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(
            services_from_geojson_str("food", "{not json"),
            Err(Error::GeoJsonError(_))
        ));
    }
}
