//! Shapefile format implementation
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj).
//! The geometry and attribute parts are handled by the `shapefile` crate; the
//! .prj sidecar is read and written verbatim so projections survive a round trip.

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde_json::{Map, Value};
use shapefile::dbase::{self, FieldName, FieldType, FieldValue as DbaseFieldValue, TableWriterBuilder};
use shapefile::{PolygonRing, Shape};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GeowrangleError, Result};
use crate::formats::{dataset_name, VectorFormat};
use crate::models::{value_text, Crs, Feature, FieldDef, FieldKind, VectorDataset};

/// dBase limits field names to 10 bytes
pub const MAX_FIELD_NAME_LEN: usize = 10;

/// ESRI WKT for WGS 84, written when a dataset carries no projection text
const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// Shapefile reader/writer
pub struct ShapefileFormat;

impl VectorFormat for ShapefileFormat {
    fn read(&self, path: &Path) -> Result<VectorDataset> {
        verify_components(path)?;

        let mut reader = shapefile::Reader::from_path(path).map_err(|e| format_error(format!(
            "Failed to open {}: {}",
            path.display(),
            e
        )))?;

        let schema = read_schema(path)?;
        let crs = read_crs(path)?;

        let mut features = Vec::new();
        for result in reader.iter_shapes_and_records() {
            let (shape, record) =
                result.map_err(|e| format_error(format!("Failed to read feature: {}", e)))?;

            let geometry = shape_to_geometry(&shape)?;
            let properties = record_to_properties(record);
            features.push(Feature::new(geometry, properties));
        }

        Ok(VectorDataset { name: dataset_name(path), crs, schema, features })
    }

    fn write(&self, dataset: &VectorDataset, path: &Path) -> Result<()> {
        let base = shapefile_base(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let columns = dbase_columns(&dataset.schema)?;
        let mut builder = TableWriterBuilder::new();
        for (field, name) in &columns {
            let name = field_name(name)?;
            builder = match field.kind {
                FieldKind::Text { width } => builder.add_character_field(name, width.max(1)),
                FieldKind::Float { width, decimals } => {
                    builder.add_numeric_field(name, width, decimals)
                }
                FieldKind::Integer => builder.add_numeric_field(name, 18, 0),
                FieldKind::Boolean => builder.add_logical_field(name),
                // Dates are stored as ISO text
                FieldKind::Date => builder.add_character_field(name, 10),
            };
        }

        let mut writer = shapefile::Writer::from_path(path, builder).map_err(|e| format_error(
            format!("Failed to create {}: {}", path.display(), e),
        ))?;

        for (idx, feature) in dataset.features.iter().enumerate() {
            let geometry = match &feature.geometry {
                Some(g) => g,
                None => {
                    tracing::warn!("Skipping feature {} of {}: null geometry", idx, dataset.name);
                    continue;
                }
            };

            let mut record = dbase::Record::default();
            for (field, name) in &columns {
                record.insert(
                    name.clone(),
                    to_dbase_value(field.kind, feature.property(&field.name)),
                );
            }

            let written = match geometry_to_shape(geometry)? {
                ShapeOut::Point(p) => writer.write_shape_and_record(&p, &record),
                ShapeOut::Multipoint(p) => writer.write_shape_and_record(&p, &record),
                ShapeOut::Polyline(p) => writer.write_shape_and_record(&p, &record),
                ShapeOut::Polygon(p) => writer.write_shape_and_record(&p, &record),
            };
            written.map_err(|e| format_error(format!("Failed to write feature {}: {}", idx, e)))?;
        }
        drop(writer);

        write_prj(&base, &dataset.crs)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }
}

fn format_error(message: String) -> GeowrangleError {
    GeowrangleError::FormatError { format: "Shapefile".to_string(), message }
}

/// Check if a path has a specific extension
fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Base path for a Shapefile (without extension)
fn shapefile_base(path: &Path) -> Result<PathBuf> {
    if !has_extension(path, "shp") {
        return Err(GeowrangleError::InvalidPath {
            path: path.to_path_buf(),
            reason: "Not a Shapefile (.shp)".to_string(),
        });
    }
    Ok(path.with_extension(""))
}

/// Verify that all required component files exist
fn verify_components(path: &Path) -> Result<()> {
    let base = shapefile_base(path)?;
    if !path.exists() {
        return Err(GeowrangleError::FileNotFound { path: path.to_path_buf() });
    }

    let missing: Vec<String> = ["shp", "shx", "dbf"]
        .iter()
        .filter(|ext| !base.with_extension(ext).exists())
        .map(|ext| format!(".{}", ext))
        .collect();

    if !missing.is_empty() {
        return Err(format_error(format!(
            "Missing required component files: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Column definitions from the .dbf header, in file order
fn read_schema(path: &Path) -> Result<Vec<FieldDef>> {
    let dbf_path = path.with_extension("dbf");
    let reader = dbase::Reader::from_path(&dbf_path)
        .map_err(|e| format_error(format!("Failed to open {}: {}", dbf_path.display(), e)))?;

    let schema = reader
        .fields()
        .iter()
        .filter(|info| info.name() != "DeletionFlag")
        .map(|info| {
            let width = info.length();
            let kind = match info.field_type() {
                FieldType::Character | FieldType::Memo => FieldKind::Text { width: width.max(1) },
                FieldType::Integer => FieldKind::Integer,
                FieldType::Logical => FieldKind::Boolean,
                FieldType::Date | FieldType::DateTime => FieldKind::Date,
                FieldType::Numeric
                | FieldType::Float
                | FieldType::Double
                | FieldType::Currency => FieldKind::Float {
                    width: width.max(1),
                    decimals: width.saturating_sub(2).min(11),
                },
                #[allow(unreachable_patterns)]
                _ => FieldKind::Text { width: width.max(1) },
            };
            FieldDef::new(info.name(), kind)
        })
        .collect();

    Ok(schema)
}

/// Extract the CRS from the .prj sidecar, defaulting to WGS 84
fn read_crs(path: &Path) -> Result<Crs> {
    let prj_path = path.with_extension("prj");
    if !prj_path.exists() {
        tracing::warn!("{} has no .prj file, assuming EPSG:4326", path.display());
        return Ok(Crs::wgs84());
    }

    let wkt = fs::read_to_string(&prj_path)
        .map_err(|e| format_error(format!("Failed to read .prj file: {}", e)))?;
    let wkt = wkt.trim().to_string();

    let epsg = parse_epsg_from_wkt(&wkt)
        .or_else(|| esri_datum_epsg(&wkt))
        .unwrap_or(4326);
    let name = wkt_name(&wkt).unwrap_or_else(|| format!("EPSG:{}", epsg));

    Ok(Crs::new(epsg, name).with_wkt(wkt))
}

/// Parse EPSG code from WKT string
fn parse_epsg_from_wkt(wkt: &str) -> Option<u32> {
    // Outermost AUTHORITY is the last one in the string
    if let Some(start) = wkt.rfind("AUTHORITY[\"EPSG\",") {
        let digits: String = wkt[start + 17..]
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(code) = digits.parse::<u32>() {
            return Some(code);
        }
    }

    if let Some(start) = wkt.find("EPSG:") {
        let digits: String = wkt[start + 5..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        return digits.parse::<u32>().ok();
    }

    None
}

/// ESRI .prj files omit AUTHORITY; recognise the common geographic ones
fn esri_datum_epsg(wkt: &str) -> Option<u32> {
    if !wkt.starts_with("GEOGCS") {
        return None;
    }
    match wkt_name(wkt)?.as_str() {
        "GCS_WGS_1984" | "WGS 84" => Some(4326),
        "GCS_North_American_1983" | "NAD83" => Some(4269),
        "GCS_North_American_1927" | "NAD27" => Some(4267),
        _ => None,
    }
}

/// Name of the outermost WKT node, e.g. `PROJCS["<name>", ...`
fn wkt_name(wkt: &str) -> Option<String> {
    let start = wkt.find("[\"")? + 2;
    let end = wkt[start..].find('"')?;
    Some(wkt[start..start + end].to_string())
}

fn write_prj(base: &Path, crs: &Crs) -> Result<()> {
    let prj_path = base.with_extension("prj");
    match (&crs.wkt, crs.epsg) {
        (Some(wkt), _) => fs::write(&prj_path, wkt)?,
        (None, 4326) => fs::write(&prj_path, WGS84_PRJ)?,
        (None, epsg) => {
            tracing::warn!(
                "No WKT available for EPSG:{}, {} written without .prj",
                epsg,
                base.display()
            );
            if prj_path.exists() {
                fs::remove_file(&prj_path)?;
            }
        }
    }
    Ok(())
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name)
        .map_err(|_| format_error(format!("'{}' is not a valid dBase field name", name)))
}

/// Pair each schema field with its dBase column name.
///
/// Names longer than the dBase limit are truncated. A truncated name that
/// clashes with an earlier column (case-insensitively, as dBase readers
/// compare them) is shortened further and numbered: `population_1` and
/// `population_2` become `population` and `populati_1`.
fn dbase_columns(schema: &[FieldDef]) -> Result<Vec<(&FieldDef, String)>> {
    let mut taken = HashSet::with_capacity(schema.len());
    let mut columns = Vec::with_capacity(schema.len());

    for field in schema {
        let mut short = truncate_name(&field.name, MAX_FIELD_NAME_LEN).to_string();
        let mut n = 1;
        while taken.contains(&short.to_ascii_lowercase()) {
            let suffix = format!("_{}", n);
            short = format!("{}{}", truncate_name(&field.name, MAX_FIELD_NAME_LEN - suffix.len()), suffix);
            n += 1;
        }
        if short != field.name {
            tracing::debug!("Writing field '{}' as dBase column '{}'", field.name, short);
        }
        field_name(&short)?;
        taken.insert(short.to_ascii_lowercase());
        columns.push((field, short));
    }

    Ok(columns)
}

/// Longest prefix of `name` that fits in `max` bytes
fn truncate_name(name: &str, max: usize) -> &str {
    let mut end = name.len().min(max);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

fn to_dbase_value(kind: FieldKind, value: Option<&Value>) -> DbaseFieldValue {
    let value = value.filter(|v| !v.is_null());
    match kind {
        FieldKind::Text { .. } | FieldKind::Date => {
            DbaseFieldValue::Character(value.and_then(value_text))
        }
        FieldKind::Float { .. } | FieldKind::Integer => DbaseFieldValue::Numeric(
            value.and_then(|v| v.as_f64().or_else(|| value_text(v)?.parse().ok())),
        ),
        FieldKind::Boolean => DbaseFieldValue::Logical(value.and_then(Value::as_bool)),
    }
}

fn record_to_properties(record: dbase::Record) -> Map<String, Value> {
    std::collections::HashMap::<String, DbaseFieldValue>::from(record)
        .into_iter()
        .map(|(name, value)| (name, convert_dbase_value(value)))
        .collect()
}

/// Convert dBase field value to JSON value
fn convert_dbase_value(value: DbaseFieldValue) -> Value {
    let number = |n: f64| {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    };

    match value {
        DbaseFieldValue::Character(Some(s)) => Value::String(s),
        DbaseFieldValue::Numeric(Some(n)) => number(n),
        DbaseFieldValue::Logical(Some(b)) => Value::Bool(b),
        DbaseFieldValue::Date(Some(date)) => Value::String(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        DbaseFieldValue::Float(Some(f)) => number(f as f64),
        DbaseFieldValue::Integer(i) => Value::Number(i.into()),
        DbaseFieldValue::Currency(c) | DbaseFieldValue::Double(c) => number(c),
        DbaseFieldValue::DateTime(dt) => Value::String(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Memo(s) => Value::String(s),
        DbaseFieldValue::Character(None)
        | DbaseFieldValue::Numeric(None)
        | DbaseFieldValue::Logical(None)
        | DbaseFieldValue::Date(None)
        | DbaseFieldValue::Float(None) => Value::Null,
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

/// Convert a shapefile shape to a `geo` geometry; Z and M values are dropped
fn shape_to_geometry(shape: &Shape) -> Result<Option<Geometry<f64>>> {
    let geometry = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => Point::new(p.x, p.y).into(),
        Shape::PointM(p) => Point::new(p.x, p.y).into(),
        Shape::PointZ(p) => Point::new(p.x, p.y).into(),
        Shape::Multipoint(mp) => points_to_geometry(mp.points(), |p| Coord { x: p.x, y: p.y }),
        Shape::MultipointM(mp) => points_to_geometry(mp.points(), |p| Coord { x: p.x, y: p.y }),
        Shape::MultipointZ(mp) => points_to_geometry(mp.points(), |p| Coord { x: p.x, y: p.y }),
        Shape::Polyline(pl) => parts_to_geometry(pl.parts(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolylineM(pl) => parts_to_geometry(pl.parts(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolylineZ(pl) => parts_to_geometry(pl.parts(), |p| Coord { x: p.x, y: p.y }),
        Shape::Polygon(pg) => rings_to_geometry(pg.rings(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolygonM(pg) => rings_to_geometry(pg.rings(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolygonZ(pg) => rings_to_geometry(pg.rings(), |p| Coord { x: p.x, y: p.y }),
        Shape::Multipatch(_) => {
            return Err(format_error("Multipatch geometry type is not supported".to_string()))
        }
    };
    Ok(Some(geometry))
}

fn points_to_geometry<P>(points: &[P], xy: impl Fn(&P) -> Coord<f64>) -> Geometry<f64> {
    MultiPoint::new(points.iter().map(|p| Point::from(xy(p))).collect()).into()
}

fn parts_to_geometry<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> Coord<f64>) -> Geometry<f64> {
    let mut lines: Vec<LineString<f64>> = parts
        .iter()
        .map(|part| part.iter().map(&xy).collect())
        .collect();

    if lines.len() == 1 {
        lines.remove(0).into()
    } else {
        MultiLineString::new(lines).into()
    }
}

/// Outer rings start a new polygon; inner rings attach to the preceding outer ring
fn rings_to_geometry<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> Geometry<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in rings {
        let coords: LineString<f64> = ring.points().iter().map(&xy).collect();
        match ring {
            PolygonRing::Outer(_) => polygons.push((coords, Vec::new())),
            PolygonRing::Inner(_) => match polygons.last_mut() {
                Some((_, holes)) => holes.push(coords),
                None => polygons.push((coords, Vec::new())),
            },
        }
    }

    let mut polygons: Vec<Polygon<f64>> = polygons
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect();

    if polygons.len() == 1 {
        polygons.remove(0).into()
    } else {
        MultiPolygon::new(polygons).into()
    }
}

enum ShapeOut {
    Point(shapefile::Point),
    Multipoint(shapefile::Multipoint),
    Polyline(shapefile::Polyline),
    Polygon(shapefile::Polygon),
}

fn to_shp_points(line: &LineString<f64>) -> Vec<shapefile::Point> {
    line.coords().map(|c| shapefile::Point::new(c.x, c.y)).collect()
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<PolygonRing<shapefile::Point>> {
    std::iter::once(PolygonRing::Outer(to_shp_points(polygon.exterior())))
        .chain(
            polygon
                .interiors()
                .iter()
                .map(|hole| PolygonRing::Inner(to_shp_points(hole))),
        )
        .collect()
}

fn geometry_to_shape(geometry: &Geometry<f64>) -> Result<ShapeOut> {
    let shape = match geometry {
        Geometry::Point(p) => ShapeOut::Point(shapefile::Point::new(p.x(), p.y())),
        Geometry::MultiPoint(mp) => ShapeOut::Multipoint(shapefile::Multipoint::new(
            mp.iter().map(|p| shapefile::Point::new(p.x(), p.y())).collect(),
        )),
        Geometry::Line(l) => ShapeOut::Polyline(shapefile::Polyline::new(vec![
            shapefile::Point::new(l.start.x, l.start.y),
            shapefile::Point::new(l.end.x, l.end.y),
        ])),
        Geometry::LineString(ls) => ShapeOut::Polyline(shapefile::Polyline::new(to_shp_points(ls))),
        Geometry::MultiLineString(mls) => ShapeOut::Polyline(shapefile::Polyline::with_parts(
            mls.iter().map(to_shp_points).collect(),
        )),
        Geometry::Polygon(p) => ShapeOut::Polygon(shapefile::Polygon::with_rings(polygon_rings(p))),
        Geometry::MultiPolygon(mp) => ShapeOut::Polygon(shapefile::Polygon::with_rings(
            mp.iter().flat_map(polygon_rings).collect(),
        )),
        Geometry::Rect(r) => geometry_to_shape(&Geometry::Polygon(r.to_polygon()))?,
        Geometry::Triangle(t) => geometry_to_shape(&Geometry::Polygon(t.to_polygon()))?,
        Geometry::GeometryCollection(_) => {
            return Err(format_error(
                "GeometryCollection cannot be stored in a Shapefile".to_string(),
            ))
        }
    };
    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        let format = ShapefileFormat;
        assert_eq!(format.supported_extensions(), &["shp"]);
        assert_eq!(format.format_name(), "Shapefile");
    }

    #[test]
    fn test_missing_file() {
        let format = ShapefileFormat;
        let result = format.read(Path::new("/nonexistent/test.shp"));
        assert!(matches!(result, Err(GeowrangleError::FileNotFound { .. })));
    }

    #[test]
    fn test_shapefile_base_rejects_other_extensions() {
        assert_eq!(
            shapefile_base(Path::new("/data/roads.shp")).unwrap(),
            PathBuf::from("/data/roads")
        );
        assert!(shapefile_base(Path::new("/data/roads.gpkg")).is_err());
    }

    #[test]
    fn test_parse_epsg_from_wkt() {
        let wkt1 = r#"GEOGCS["WGS 84",DATUM["WGS_1984"],AUTHORITY["EPSG","4326"]]"#;
        assert_eq!(parse_epsg_from_wkt(wkt1), Some(4326));

        let wkt2 = "EPSG:3857";
        assert_eq!(parse_epsg_from_wkt(wkt2), Some(3857));

        let esri = r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983"]]"#;
        assert_eq!(parse_epsg_from_wkt(esri), None);
        assert_eq!(esri_datum_epsg(esri), Some(4269));
        assert_eq!(wkt_name(esri).as_deref(), Some("GCS_North_American_1983"));
    }

    #[test]
    fn test_rings_group_holes_with_outer() {
        let square = |o: f64, s: f64| {
            vec![
                shapefile::Point::new(o, o),
                shapefile::Point::new(o, o + s),
                shapefile::Point::new(o + s, o + s),
                shapefile::Point::new(o + s, o),
                shapefile::Point::new(o, o),
            ]
        };
        let rings = vec![
            PolygonRing::Outer(square(0.0, 10.0)),
            PolygonRing::Inner(square(2.0, 2.0)),
            PolygonRing::Outer(square(20.0, 5.0)),
        ];

        match rings_to_geometry(&rings, |p| Coord { x: p.x, y: p.y }) {
            Geometry::MultiPolygon(mp) => {
                assert_eq!(mp.0.len(), 2);
                assert_eq!(mp.0[0].interiors().len(), 1);
                assert!(mp.0[1].interiors().is_empty());
            }
            other => panic!("expected MultiPolygon, got {:?}", other),
        }
    }

    #[test]
    fn test_long_field_names_truncated() {
        let schema = vec![FieldDef::text("population_total", 8)];
        let columns = dbase_columns(&schema).unwrap();
        assert_eq!(columns[0].1, "population");
        assert_eq!(columns[0].0.name, "population_total");
    }

    #[test]
    fn test_truncated_field_names_stay_unique() {
        let schema = vec![
            FieldDef::text("population_1", 8),
            FieldDef::text("population_2", 8),
            FieldDef::text("POPULATION_3", 8),
            FieldDef::text("name", 8),
        ];
        let names: Vec<_> = dbase_columns(&schema).unwrap().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["population", "populati_1", "POPULATI_2", "name"]);
    }

    #[test]
    fn test_truncate_name_respects_char_boundaries() {
        assert_eq!(truncate_name("höhe_über_null", 10), "höhe_übe");
        assert_eq!(truncate_name("id", 10), "id");
    }
}
