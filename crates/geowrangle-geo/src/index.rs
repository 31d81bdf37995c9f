//! R-tree over feature bounding boxes

use geo::{BoundingRect, Geometry, Rect};
use geowrangle_core::VectorDataset;
use rstar::{RTree, RTreeObject, AABB};

/// Position of a feature in its dataset, keyed by its envelope
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedFeature {
    pub index: usize,
    envelope: AABB<[f64; 2]>,
}

impl IndexedFeature {
    fn new(index: usize, rect: Rect<f64>) -> Self {
        Self { index, envelope: rect_envelope(rect) }
    }
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn rect_envelope(rect: Rect<f64>) -> AABB<[f64; 2]> {
    let min = rect.min();
    let max = rect.max();
    AABB::from_corners([min.x, min.y], [max.x, max.y])
}

/// Spatial index used to find candidate feature pairs before exact predicates
pub struct SpatialIndex {
    tree: RTree<IndexedFeature>,
}

impl SpatialIndex {
    /// Index every feature of `dataset` that has a non-empty geometry
    pub fn from_dataset(dataset: &VectorDataset) -> Self {
        let indexed: Vec<IndexedFeature> = dataset
            .features
            .iter()
            .enumerate()
            .filter_map(|(idx, feature)| {
                let rect = feature.geometry.as_ref()?.bounding_rect()?;
                Some(IndexedFeature::new(idx, rect))
            })
            .collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Feature indices whose envelope overlaps `geometry`'s envelope, ascending
    pub fn candidates(&self, geometry: &Geometry<f64>) -> Vec<usize> {
        let Some(rect) = geometry.bounding_rect() else {
            return Vec::new();
        };

        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&rect_envelope(rect))
            .map(|item| item.index)
            .collect();
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon};
    use geowrangle_core::{Crs, Feature};

    fn dataset() -> VectorDataset {
        VectorDataset::from_features(
            "roads",
            Crs::wgs84(),
            vec![
                Feature::from_geometry(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]),
                Feature::new(None, Default::default()),
                Feature::from_geometry(point!(x: 5.0, y: 5.0)),
                Feature::from_geometry(line_string![(x: 0.5, y: -1.0), (x: 0.5, y: 3.0)]),
            ],
        )
    }

    #[test]
    fn test_skips_null_geometries() {
        let index = SpatialIndex::from_dataset(&dataset());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_candidates_sorted_by_position() {
        let index = SpatialIndex::from_dataset(&dataset());
        let window: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
        ]
        .into();

        assert_eq!(index.candidates(&window), vec![0, 3]);
    }

    #[test]
    fn test_point_envelope_is_queryable() {
        let index = SpatialIndex::from_dataset(&dataset());
        let query: Geometry<f64> = point!(x: 5.0, y: 5.0).into();
        assert_eq!(index.candidates(&query), vec![2]);
    }
}
