//! GeoJSON format implementation

use geojson::{FeatureCollection, GeoJson, JsonObject};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

use crate::error::{GeowrangleError, Result};
use crate::formats::{dataset_name, VectorFormat};
use crate::models::{Crs, Feature, VectorDataset};

/// GeoJSON reader/writer
pub struct GeoJsonFormat;

impl VectorFormat for GeoJsonFormat {
    fn read(&self, path: &Path) -> Result<VectorDataset> {
        if !path.exists() {
            return Err(GeowrangleError::FileNotFound { path: path.to_path_buf() });
        }

        let content = fs::read_to_string(path)?;
        let geojson: GeoJson = content
            .parse()
            .map_err(|e| format_error(format!("Failed to parse GeoJSON: {}", e)))?;

        let (features, epsg) = match geojson {
            GeoJson::FeatureCollection(fc) => {
                let epsg = fc
                    .foreign_members
                    .as_ref()
                    .and_then(|fm| fm.get("crs"))
                    .and_then(extract_epsg_from_crs)
                    .unwrap_or(4326);
                let features = fc
                    .features
                    .into_iter()
                    .map(convert_feature)
                    .collect::<Result<Vec<_>>>()?;
                (features, epsg)
            }
            GeoJson::Feature(feature) => (vec![convert_feature(feature)?], 4326),
            GeoJson::Geometry(geometry) => {
                let geometry = geo::Geometry::<f64>::try_from(geometry)
                    .map_err(|e| format_error(format!("Unsupported geometry: {}", e)))?;
                (vec![Feature::new(Some(geometry), Map::new())], 4326)
            }
        };

        let crs = if epsg == 4326 { Crs::wgs84() } else { Crs::new(epsg, format!("EPSG:{}", epsg)) };
        Ok(VectorDataset::from_features(dataset_name(path), crs, features))
    }

    fn write(&self, dataset: &VectorDataset, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let features = dataset
            .features
            .iter()
            .map(|feature| geojson::Feature {
                bbox: None,
                geometry: feature
                    .geometry
                    .as_ref()
                    .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
                id: None,
                properties: Some(feature.properties.clone()),
                foreign_members: None,
            })
            .collect();

        let mut foreign_members = JsonObject::new();
        if dataset.crs.epsg != 4326 {
            foreign_members.insert(
                "crs".to_string(),
                json!({ "type": "name", "properties": { "name": dataset.crs.authority() } }),
            );
        }

        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: (!foreign_members.is_empty()).then_some(foreign_members),
        };

        fs::write(path, GeoJson::from(collection).to_string())?;
        Ok(())
    }

    fn supported_extensions(&self) -> &[&str] {
        &["geojson", "json"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

fn format_error(message: String) -> GeowrangleError {
    GeowrangleError::FormatError { format: "GeoJSON".to_string(), message }
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature
        .geometry
        .map(geo::Geometry::<f64>::try_from)
        .transpose()
        .map_err(|e| format_error(format!("Unsupported geometry: {}", e)))?;

    Ok(Feature::new(geometry, feature.properties.unwrap_or_default()))
}

/// Extract EPSG code from a legacy `crs` member
fn extract_epsg_from_crs(crs: &Value) -> Option<u32> {
    // "EPSG:4326" or "urn:ogc:def:crs:EPSG::4326"
    crs.get("properties")?
        .get("name")?
        .as_str()?
        .split(':')
        .next_back()?
        .parse()
        .ok()
}
