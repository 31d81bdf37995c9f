//! Coordinate reference systems and geometry classification.

use geo::Geometry;
use serde::{Deserialize, Serialize};

/// Coordinate Reference System identified by EPSG code
///
/// `wkt` keeps the projection text exactly as it was read (for example the
/// contents of a `.prj` sidecar) so that writing a dataset back out does not
/// lose projection parameters the EPSG code alone cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
    pub wkt: Option<String>,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into(), wkt: None }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }

    /// Attach the original WKT definition
    pub fn with_wkt(mut self, wkt: impl Into<String>) -> Self {
        self.wkt = Some(wkt.into());
        self
    }

    /// `EPSG:<code>` authority string
    pub fn authority(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GeometryType {
    #[default]
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    Mixed,
    /// Dataset without any geometry
    None,
}

impl GeometryType {
    /// Classify a `geo` geometry
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::Line(_) | Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
                GeometryType::Polygon
            }
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    /// Polygon or MultiPolygon
    pub fn is_polygonal(&self) -> bool {
        matches!(self, GeometryType::Polygon | GeometryType::MultiPolygon)
    }

    pub fn is_lineal(&self) -> bool {
        matches!(self, GeometryType::LineString | GeometryType::MultiLineString)
    }

    pub fn is_puntal(&self) -> bool {
        matches!(self, GeometryType::Point | GeometryType::MultiPoint)
    }

    /// Dimension family: 0 for points, 1 for lines, 2 for polygons
    pub fn dimension(&self) -> Option<u8> {
        if self.is_puntal() {
            Some(0)
        } else if self.is_lineal() {
            Some(1)
        } else if self.is_polygonal() {
            Some(2)
        } else {
            None
        }
    }
}

impl std::fmt::Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon};

    #[test]
    fn test_classification() {
        let p: Geometry<f64> = point!(x: 1.0, y: 2.0).into();
        let l: Geometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)].into();
        let poly: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ]
        .into();

        assert_eq!(GeometryType::of(&p), GeometryType::Point);
        assert_eq!(GeometryType::of(&l), GeometryType::LineString);
        assert!(GeometryType::of(&poly).is_polygonal());
        assert_eq!(GeometryType::of(&l).dimension(), Some(1));
        assert_eq!(GeometryType::Mixed.dimension(), None);
    }

    #[test]
    fn test_crs_authority() {
        let crs = Crs::web_mercator().with_wkt("PROJCS[\"WGS 84 / Pseudo-Mercator\"]");
        assert_eq!(crs.authority(), "EPSG:3857");
        assert!(crs.wkt.is_some());
        assert_eq!(Crs::default().epsg, 4326);
    }
}
