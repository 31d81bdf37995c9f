//! Intersects spatial join

use geo::Intersects;
use geowrangle_core::models::value_text;
use geowrangle_core::{Result, VectorDataset};
use std::collections::HashSet;

use crate::index::SpatialIndex;

/// Rows of `shape` whose `id_field` value belongs to a row intersecting `aoi`.
///
/// Selection is by identifier, so every row sharing an identifier with an
/// intersecting row is kept. Geometry and attributes are unchanged and rows
/// keep their order in `shape`.
pub fn overlapping_rows(
    aoi: &VectorDataset,
    shape: &VectorDataset,
    id_field: &str,
) -> Result<VectorDataset> {
    shape.require_field(id_field)?;

    let hits = intersecting_rows(aoi, shape);
    let ids: HashSet<String> = hits
        .iter()
        .filter_map(|&idx| shape.features[idx].property(id_field).and_then(value_text))
        .collect();

    tracing::debug!(
        "{} rows of {} intersect {}, {} distinct {}",
        hits.len(),
        shape.name,
        aoi.name,
        ids.len(),
        id_field
    );

    Ok(shape.select(|_, feature| {
        feature.property(id_field).and_then(value_text).is_some_and(|id| ids.contains(&id))
    }))
}

/// Positions in `shape` of rows intersecting at least one row of `aoi`, ascending
pub fn intersecting_rows(aoi: &VectorDataset, shape: &VectorDataset) -> Vec<usize> {
    let index = SpatialIndex::from_dataset(shape);
    let mut hits = HashSet::new();

    for geometry in aoi.features.iter().filter_map(|f| f.geometry.as_ref()) {
        for idx in index.candidates(geometry) {
            if hits.contains(&idx) {
                continue;
            }
            let Some(candidate) = &shape.features[idx].geometry else { continue };
            if geometry.intersects(candidate) {
                hits.insert(idx);
            }
        }
    }

    let mut hits: Vec<usize> = hits.into_iter().collect();
    hits.sort_unstable();
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon};
    use geowrangle_core::{Crs, Feature, GeowrangleError};

    fn aoi() -> VectorDataset {
        VectorDataset::from_features(
            "aoi",
            Crs::wgs84(),
            vec![Feature::from_geometry(polygon![
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
            ])],
        )
    }

    fn ways() -> VectorDataset {
        VectorDataset::from_features(
            "ways",
            Crs::wgs84(),
            vec![
                Feature::from_geometry(point!(x: 20.0, y: 20.0)).with_property("osm_id", 3),
                Feature::from_geometry(point!(x: 5.0, y: 5.0)).with_property("osm_id", 1),
                Feature::from_geometry(line_string![(x: -5.0, y: 5.0), (x: 5.0, y: 5.0)])
                    .with_property("osm_id", 2),
                Feature::from_geometry(point!(x: 30.0, y: 30.0)).with_property("osm_id", 1),
                Feature::from_geometry(point!(x: 40.0, y: 40.0)),
            ],
        )
    }

    #[test]
    fn test_intersecting_rows() {
        assert_eq!(intersecting_rows(&aoi(), &ways()), vec![1, 2]);
    }

    #[test]
    fn test_selection_by_identifier_keeps_order() {
        let result = overlapping_rows(&aoi(), &ways(), "osm_id").unwrap();

        let ids: Vec<_> = result.features.iter().filter_map(|f| f.property_text("osm_id")).collect();
        // Row 3 shares osm_id 1 with an intersecting row
        assert_eq!(ids, vec!["1", "2", "1"]);
        assert_eq!(result.features[2].geometry, Some(point!(x: 30.0, y: 30.0).into()));
    }

    #[test]
    fn test_missing_identifier_column() {
        let result = overlapping_rows(&aoi(), &ways(), "way_id");
        assert!(matches!(result, Err(GeowrangleError::FieldNotFound { .. })));
    }
}
