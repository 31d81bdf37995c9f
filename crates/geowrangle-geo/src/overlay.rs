//! Polygon overlay

use geo::{BooleanOps, Geometry, MultiPolygon};
use geowrangle_core::models::GeometryType;
use geowrangle_core::{Feature, FieldDef, GeowrangleError, Result, VectorDataset};
use serde_json::Map;

use crate::index::SpatialIndex;

/// Intersect every feature of `aoi` with every feature of `shape`.
///
/// Each non-empty piece carries the attributes of both parents. Columns
/// present on both sides are renamed with `_1` (from `aoi`) and `_2`
/// (from `shape`). Output order follows `aoi`, then `shape`.
pub fn intersection(aoi: &VectorDataset, shape: &VectorDataset) -> Result<VectorDataset> {
    let aoi_polygons = polygonal_geometries(aoi)?;
    let shape_polygons = polygonal_geometries(shape)?;
    let columns = MergedColumns::new(&aoi.schema, &shape.schema);
    let index = SpatialIndex::from_dataset(shape);

    let mut result = VectorDataset::new(shape.name.clone(), aoi.crs.clone(), columns.schema());

    for (a_idx, a_polygons) in aoi_polygons.iter().enumerate() {
        let Some(a_polygons) = a_polygons else { continue };
        let envelope = Geometry::MultiPolygon(a_polygons.clone());

        for b_idx in index.candidates(&envelope) {
            let Some(b_polygons) = &shape_polygons[b_idx] else { continue };

            let piece = a_polygons.intersection(b_polygons);
            if piece.0.is_empty() {
                continue;
            }

            let properties = columns.merge(&aoi.features[a_idx], &shape.features[b_idx]);
            result.features.push(Feature::new(Some(simplify_multi(piece)), properties));
        }
    }

    tracing::debug!(
        "Overlay of {} ({}) and {} ({}) produced {} features",
        aoi.name,
        aoi.len(),
        shape.name,
        shape.len(),
        result.len()
    );

    Ok(result)
}

/// Polygonal geometry of each feature, rejecting anything else
fn polygonal_geometries(dataset: &VectorDataset) -> Result<Vec<Option<MultiPolygon<f64>>>> {
    dataset
        .features
        .iter()
        .enumerate()
        .map(|(idx, feature)| match &feature.geometry {
            None => Ok(None),
            Some(geometry) => to_multi_polygon(geometry)
                .map(Some)
                .ok_or_else(|| GeowrangleError::MixedGeometry {
                    dataset: dataset.name.clone(),
                    feature_index: idx,
                    geometry_type: GeometryType::of(geometry).to_string(),
                }),
        })
        .collect()
}

fn to_multi_polygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        _ => None,
    }
}

fn simplify_multi(mut multi: MultiPolygon<f64>) -> Geometry<f64> {
    if multi.0.len() == 1 {
        Geometry::Polygon(multi.0.remove(0))
    } else {
        Geometry::MultiPolygon(multi)
    }
}

/// Column names of `fields`, suffixed where `other` has the same name
fn suffixed<'a>(fields: &'a [FieldDef], other: &[FieldDef], suffix: &str) -> Vec<(&'a FieldDef, String)> {
    fields
        .iter()
        .map(|field| {
            let name = if other.iter().any(|f| f.name == field.name) {
                format!("{}{}", field.name, suffix)
            } else {
                field.name.clone()
            };
            (field, name)
        })
        .collect()
}

/// Column layout of an overlay result
struct MergedColumns<'a> {
    left: Vec<(&'a FieldDef, String)>,
    right: Vec<(&'a FieldDef, String)>,
}

impl<'a> MergedColumns<'a> {
    fn new(left: &'a [FieldDef], right: &'a [FieldDef]) -> Self {
        Self { left: suffixed(left, right, "_1"), right: suffixed(right, left, "_2") }
    }

    fn schema(&self) -> Vec<FieldDef> {
        self.left
            .iter()
            .chain(&self.right)
            .map(|(field, name)| FieldDef::new(name.clone(), field.kind))
            .collect()
    }

    fn merge(&self, left: &Feature, right: &Feature) -> Map<String, serde_json::Value> {
        let mut properties = Map::new();
        for (columns, feature) in [(&self.left, left), (&self.right, right)] {
            for (field, name) in columns {
                if let Some(value) = feature.property(&field.name) {
                    properties.insert(name.clone(), value.clone());
                }
            }
        }
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon, Area};
    use geowrangle_core::Crs;

    fn square(x: f64, y: f64, size: f64) -> geo::Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]
    }

    fn aoi() -> VectorDataset {
        VectorDataset::from_features(
            "aoi",
            Crs::wgs84(),
            vec![Feature::from_geometry(square(0.0, 0.0, 10.0))
                .with_property("name", "mission")
                .with_property("area_id", 1)],
        )
    }

    fn parcels() -> VectorDataset {
        VectorDataset::from_features(
            "parcels",
            Crs::wgs84(),
            vec![
                Feature::from_geometry(square(5.0, 5.0, 10.0)).with_property("name", "north"),
                Feature::from_geometry(square(20.0, 20.0, 1.0)).with_property("name", "far"),
                Feature::from_geometry(square(-5.0, -5.0, 7.0)).with_property("name", "south"),
            ],
        )
    }

    #[test]
    fn test_intersection_pieces_and_areas() {
        let result = intersection(&aoi(), &parcels()).unwrap();

        assert_eq!(result.len(), 2);
        let areas: Vec<f64> = result
            .features
            .iter()
            .map(|f| f.geometry.as_ref().unwrap().unsigned_area())
            .collect();
        assert!((areas[0] - 25.0).abs() < 1e-9);
        assert!((areas[1] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_clashing_columns_get_suffixes() {
        let result = intersection(&aoi(), &parcels()).unwrap();

        let names: Vec<_> = result.schema.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"name_1"));
        assert!(names.contains(&"name_2"));
        assert!(names.contains(&"area_id"));

        let first = &result.features[0];
        assert_eq!(first.property_text("name_1").as_deref(), Some("mission"));
        assert_eq!(first.property_text("name_2").as_deref(), Some("north"));
        assert_eq!(first.property_text("area_id").as_deref(), Some("1"));
    }

    #[test]
    fn test_disjoint_inputs_give_empty_result() {
        let far = VectorDataset::from_features(
            "far",
            Crs::wgs84(),
            vec![Feature::from_geometry(square(100.0, 100.0, 1.0))],
        );
        let result = intersection(&aoi(), &far).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_lines_are_rejected() {
        let roads = VectorDataset::from_features(
            "roads",
            Crs::wgs84(),
            vec![
                Feature::from_geometry(square(1.0, 1.0, 1.0)),
                Feature::from_geometry(line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 3.0)]),
            ],
        );

        match intersection(&aoi(), &roads) {
            Err(GeowrangleError::MixedGeometry { dataset, feature_index, .. }) => {
                assert_eq!(dataset, "roads");
                assert_eq!(feature_index, 1);
            }
            other => panic!("expected MixedGeometry, got {:?}", other),
        }
    }
}
