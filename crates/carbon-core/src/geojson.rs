//! Parcel input from a GeoJSON `FeatureCollection`.
//!
//! Coordinates must already be in a projected CRS with metre units. Only
//! `Polygon` and single-member `MultiPolygon` geometries are accepted.

use std::fs;
use std::path::Path;

use geo::{MultiPolygon, Polygon};
use geojson::{Feature, GeoJson};
use serde_json::Value as JsonValue;

use crate::error::{Result, SelectionError};
use crate::parcel::Parcel;

/// Feature property names holding the parcel attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNames {
    pub carbon: String,
    pub cost: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self { carbon: "carbon_sto".into(), cost: "cost".into() }
    }
}

/// Read every feature of the file at `path` as a parcel.
pub fn load_parcels(path: impl AsRef<Path>, names: &PropertyNames) -> Result<Vec<Parcel>> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_parcels(&text, names)
}

/// Parse GeoJSON text. Feature `i` becomes a parcel with `source_index = i`.
pub fn parse_parcels(text: &str, names: &PropertyNames) -> Result<Vec<Parcel>> {
    let collection = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => return Err(SelectionError::NotFeatureCollection("Feature")),
        GeoJson::Geometry(_) => return Err(SelectionError::NotFeatureCollection("Geometry")),
    };
    let parcels = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| to_parcel(i, feature, names))
        .collect::<Result<Vec<_>>>()?;
    log::info!("loaded {} parcels", parcels.len());
    Ok(parcels)
}

fn to_parcel(index: usize, feature: Feature, names: &PropertyNames) -> Result<Parcel> {
    let carbon = number_property(index, &feature, &names.carbon);
    let cost = number_property(index, &feature, &names.cost);
    let geometry = feature.geometry.ok_or_else(|| SelectionError::Geometry {
        index,
        reason: "feature has no geometry".into(),
    })?;
    let polygon = to_polygon(index, geometry.value)?;
    Parcel::new(index, polygon, carbon?, cost?)
}

fn to_polygon(index: usize, value: geojson::Value) -> Result<Polygon<f64>> {
    let fail = |reason: String| SelectionError::Geometry { index, reason };
    let malformed = |e: geojson::Error| fail(format!("malformed coordinates: {e}"));

    match value {
        geojson::Value::Polygon(_) => Polygon::<f64>::try_from(value).map_err(malformed),
        geojson::Value::MultiPolygon(_) => {
            let multi = MultiPolygon::<f64>::try_from(value).map_err(malformed)?;
            let parts = multi.0.len();
            match <[Polygon<f64>; 1]>::try_from(multi.0) {
                Ok([polygon]) => Ok(polygon),
                Err(_) => Err(fail(format!("MultiPolygon with {parts} parts is not supported"))),
            }
        }
        other => Err(fail(format!("unsupported geometry type {}", type_name(&other)))),
    }
}

fn type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn number_property(index: usize, feature: &Feature, field: &str) -> Result<f64> {
    feature
        .property(field)
        .and_then(JsonValue::as_f64)
        .ok_or_else(|| SelectionError::InvalidAttribute {
            index,
            field: field.to_string(),
            reason: "missing or not a number".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn feature(geometry: &str, carbon: f64, cost: f64) -> String {
        format!(
            r#"{{"type":"Feature","geometry":{geometry},"properties":{{"carbon_sto":{carbon},"cost":{cost}}}}}"#
        )
    }

    fn collection(features: &[String]) -> String {
        format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, features.join(","))
    }

    const SQUARE_KM: &str = r#"{"type":"Polygon","coordinates":[[[0,0],[1000,0],[1000,1000],[0,1000],[0,0]]]}"#;

    #[test]
    fn parses_polygons_and_attributes() {
        let text = collection(&[feature(SQUARE_KM, 12.5, 3.0)]);
        let parcels = parse_parcels(&text, &PropertyNames::default()).unwrap();
        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].source_index, 0);
        assert_eq!(parcels[0].carbon, 12.5);
        assert_eq!(parcels[0].cost, 3.0);
        assert_relative_eq!(parcels[0].area_km2, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn single_part_multipolygon_and_3d_positions_are_accepted() {
        let multi = r#"{"type":"MultiPolygon","coordinates":[[[[0,0,5],[500,0,5],[500,500,5],[0,500,5],[0,0,5]]]]}"#;
        let parcels = parse_parcels(&collection(&[feature(multi, 1.0, 1.0)]), &PropertyNames::default()).unwrap();
        assert_relative_eq!(parcels[0].area_km2, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn holes_reduce_area() {
        let holed = r#"{"type":"Polygon","coordinates":[
            [[0,0],[1000,0],[1000,1000],[0,1000],[0,0]],
            [[250,250],[750,250],[750,750],[250,750],[250,250]]]}"#;
        let parcels = parse_parcels(&collection(&[feature(holed, 1.0, 1.0)]), &PropertyNames::default()).unwrap();
        assert_relative_eq!(parcels[0].area_km2, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn unsupported_geometry_names_the_feature() {
        let point = r#"{"type":"Point","coordinates":[1,2]}"#;
        let text = collection(&[feature(SQUARE_KM, 1.0, 1.0), feature(point, 1.0, 1.0)]);
        match parse_parcels(&text, &PropertyNames::default()) {
            Err(SelectionError::Geometry { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("Point"));
            }
            other => panic!("expected geometry error, got {other:?}"),
        }
    }

    #[test]
    fn missing_attribute_is_reported() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":null,"properties":{}}]}"#;
        assert!(matches!(
            parse_parcels(text, &PropertyNames::default()),
            Err(SelectionError::Geometry { index: 0, .. })
        ));

        let names = PropertyNames { carbon: "stock".into(), cost: "cost".into() };
        let text = collection(&[feature(SQUARE_KM, 1.0, 1.0)]);
        assert!(matches!(
            parse_parcels(&text, &names),
            Err(SelectionError::InvalidAttribute { ref field, .. }) if field == "stock"
        ));
    }

    #[test]
    fn multi_part_and_non_collection_inputs_are_rejected() {
        let two_parts = r#"{"type":"MultiPolygon","coordinates":[
            [[[0,0],[10,0],[10,10],[0,10],[0,0]]],
            [[[20,0],[30,0],[30,10],[20,10],[20,0]]]]}"#;
        match parse_parcels(&collection(&[feature(two_parts, 1.0, 1.0)]), &PropertyNames::default()) {
            Err(SelectionError::Geometry { index: 0, reason }) => assert!(reason.contains("2 parts")),
            other => panic!("expected geometry error, got {other:?}"),
        }

        let lone = feature(SQUARE_KM, 1.0, 1.0);
        assert!(matches!(
            parse_parcels(&lone, &PropertyNames::default()),
            Err(SelectionError::NotFeatureCollection("Feature"))
        ));
        assert!(matches!(
            parse_parcels("{not json", &PropertyNames::default()),
            Err(SelectionError::GeoJson(_))
        ));
    }

    #[test]
    fn load_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("carbon_core_load_{}.geojson", std::process::id()));
        fs::write(&path, collection(&[feature(SQUARE_KM, 2.0, 1.0)])).unwrap();
        let parcels = load_parcels(&path, &PropertyNames::default()).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(parcels.len(), 1);
        assert!(matches!(
            load_parcels(path.with_extension("missing"), &PropertyNames::default()),
            Err(SelectionError::Io(_))
        ));
    }
}
