//! Geodatabase layer extraction
//!
//! Peels every layer out of a multi-layer container such as an ESRI file
//! geodatabase. The one geometry-bearing layer is copied verbatim into a
//! Shapefile; every other layer is tabular and is dumped to CSV.

use gdal::errors::GdalError;
use gdal::vector::{
    Feature, FieldDefn, FieldValue, Geometry, LayerAccess, LayerOptions, OGRwkbGeometryType,
};
use gdal::DriverManager;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GeowrangleError, Result};
use crate::formats::gdal_utils::{
    convert_gdal_error, get_layer_names, open_vector, open_vector_with_driver,
};

/// Driver used for the geometry-bearing layer
pub const GEOMETRY_LAYER_DRIVER: &str = "OpenFileGDB";

/// Where to read the geodatabase from and where its layers go
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub gdb_path: PathBuf,
    pub output_dir: PathBuf,
    /// Name of the single layer exported with geometry
    pub geometry_layer: String,
    /// OGR driver the geometry layer is read with
    pub driver: String,
}

impl ExtractOptions {
    pub fn new(
        gdb_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        geometry_layer: impl Into<String>,
    ) -> Self {
        Self {
            gdb_path: gdb_path.into(),
            output_dir: output_dir.into(),
            geometry_layer: geometry_layer.into(),
            driver: GEOMETRY_LAYER_DRIVER.to_string(),
        }
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayerKind {
    Vector,
    Tabular,
}

/// Summary of one exported layer
#[derive(Debug, Clone, Serialize)]
pub struct LayerExport {
    pub name: String,
    pub kind: LayerKind,
    pub path: PathBuf,
    pub features: usize,
}

/// Export every layer of the geodatabase, overwriting previous outputs
pub fn extract_layers(options: &ExtractOptions) -> Result<Vec<LayerExport>> {
    let layer_names = get_layer_names(&options.gdb_path)?;
    fs::create_dir_all(&options.output_dir)?;

    let mut exports = Vec::with_capacity(layer_names.len());
    for layer_name in layer_names {
        let export = if layer_name == options.geometry_layer {
            let path = options.output_dir.join(format!("{}.shp", layer_name));
            tracing::info!("Dumping {} to shapefile", layer_name);
            let features = copy_geometry_layer(options, &layer_name, &path)?;
            LayerExport { name: layer_name, kind: LayerKind::Vector, path, features }
        } else {
            let path = options.output_dir.join(format!("{}.csv", layer_name));
            tracing::info!("Dumping {} to csv", layer_name);
            let features = dump_tabular_layer(&options.gdb_path, &layer_name, &path)?;
            LayerExport { name: layer_name, kind: LayerKind::Tabular, path, features }
        };
        tracing::debug!("{} features written to {}", export.features, export.path.display());
        exports.push(export);
    }

    Ok(exports)
}

/// Copy every feature of `layer_name` into a new Shapefile with the same CRS and schema.
/// Features without geometry are kept as attribute-only records.
fn copy_geometry_layer(options: &ExtractOptions, layer_name: &str, out_path: &Path) -> Result<usize> {
    let source = open_vector_with_driver(&options.gdb_path, &options.driver)?;
    let mut layer = source
        .layer_by_name(layer_name)
        .map_err(|e| convert_gdal_error(e, &format!("Failed to open layer {}", layer_name)))?;

    let driver = DriverManager::get_driver_by_name("ESRI Shapefile")
        .map_err(|e| convert_gdal_error(e, "ESRI Shapefile driver unavailable"))?;
    remove_shapefile(out_path)?;
    let mut sink = driver
        .create_vector_only(out_path)
        .map_err(|e| convert_gdal_error(e, &format!("Failed to create {}", out_path.display())))?;

    let srs = layer.spatial_ref();
    let geometry_type = layer
        .defn()
        .geom_fields()
        .next()
        .map(|field| field.field_type())
        .unwrap_or(OGRwkbGeometryType::wkbUnknown);

    let sink_layer = sink
        .create_layer(LayerOptions {
            name: layer_name,
            srs: srs.as_ref(),
            ty: geometry_type,
            ..Default::default()
        })
        .map_err(|e| convert_gdal_error(e, "Failed to create output layer"))?;

    for field in layer.defn().fields() {
        let defn = FieldDefn::new(&field.name(), field.field_type())
            .map_err(|e| convert_gdal_error(e, "Failed to define field"))?;
        defn.set_width(field.width());
        defn.set_precision(field.precision());
        defn.add_to_layer(&sink_layer)
            .map_err(|e| convert_gdal_error(e, &format!("Failed to add field {}", field.name())))?;
    }

    let write_error = |e: GdalError| convert_gdal_error(e, "Failed to write feature");
    let mut count = 0;
    for feature in layer.features() {
        let mut copy = Feature::new(sink_layer.defn()).map_err(write_error)?;
        match feature.geometry().filter(|g| has_geometry(g)) {
            Some(geometry) => copy.set_geometry(geometry.clone()).map_err(write_error)?,
            None => tracing::debug!("Feature {} of {} has no geometry", count, layer_name),
        }

        // Fields were added in source order, so indices line up
        for idx in 0..feature.field_count() {
            if let Some(value) = feature.field(idx).map_err(write_error)? {
                copy.set_field(idx, &value).map_err(write_error)?;
            }
        }

        copy.create(&sink_layer).map_err(write_error)?;
        count += 1;
    }

    Ok(count)
}

/// A feature of a geometry layer hands out a wrapper even when its geometry is null
fn has_geometry(geometry: &Geometry) -> bool {
    // SAFETY: the pointer is only compared against null, never dereferenced
    !unsafe { geometry.c_geometry() }.is_null()
}

/// Write the attribute rows of a tabular layer to CSV with a leading row index
fn dump_tabular_layer(gdb_path: &Path, layer_name: &str, out_path: &Path) -> Result<usize> {
    let source = open_vector(gdb_path)?;
    let mut layer = source
        .layer_by_name(layer_name)
        .map_err(|e| convert_gdal_error(e, &format!("Failed to open layer {}", layer_name)))?;

    let columns: Vec<String> = layer.defn().fields().map(|field| field.name()).collect();

    let mut writer = csv::Writer::from_path(out_path).map_err(csv_error)?;
    writer
        .write_record(std::iter::once(String::new()).chain(columns.iter().cloned()))
        .map_err(csv_error)?;

    let mut count = 0;
    for feature in layer.features() {
        let mut row = vec![String::new(); columns.len() + 1];
        row[0] = count.to_string();
        for (name, value) in feature.fields() {
            if let Some(idx) = columns.iter().position(|c| *c == name) {
                row[idx + 1] = value.map(field_value_text).unwrap_or_default();
            }
        }
        writer.write_record(&row).map_err(csv_error)?;
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}

/// Shapefile driver refuses to overwrite; clear the previous run's components
fn remove_shapefile(path: &Path) -> Result<()> {
    for ext in ["shp", "shx", "dbf", "prj", "cpg"] {
        let component = path.with_extension(ext);
        if component.exists() {
            fs::remove_file(&component)?;
        }
    }
    Ok(())
}

fn csv_error(err: csv::Error) -> GeowrangleError {
    GeowrangleError::FormatError { format: "CSV".to_string(), message: err.to_string() }
}

/// Render an OGR field value as a CSV cell
pub fn field_value_text(value: FieldValue) -> String {
    match value {
        FieldValue::StringValue(s) => s,
        FieldValue::IntegerValue(i) => i.to_string(),
        FieldValue::Integer64Value(i) => i.to_string(),
        FieldValue::RealValue(f) => format!("{:?}", f),
        FieldValue::DateValue(d) => d.to_string(),
        FieldValue::DateTimeValue(dt) => dt.to_rfc3339(),
        FieldValue::StringListValue(list) => list.join(";"),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::read_vector;
    use gdal::spatial_ref::SpatialRef;
    use gdal::vector::OGRFieldType;

    /// GeoPackage with one block group layer (one row lacks geometry) and one attribute table
    fn write_source(path: &Path) {
        let driver = DriverManager::get_driver_by_name("GPKG").unwrap();
        let mut dataset = driver.create_vector_only(path).unwrap();
        let srs = SpatialRef::from_epsg(4326).unwrap();

        let blocks = dataset
            .create_layer(LayerOptions {
                name: "BLOCKGROUPS",
                srs: Some(&srs),
                ty: OGRwkbGeometryType::wkbPolygon,
                ..Default::default()
            })
            .unwrap();
        blocks
            .create_defn_fields(&[("GEOID", OGRFieldType::OFTString), ("POP", OGRFieldType::OFTInteger)])
            .unwrap();
        for (geoid, pop, wkt) in [
            ("060014001001", 1200, Some("POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))")),
            ("060014001002", 850, Some("POLYGON ((1 0, 1 1, 2 1, 2 0, 1 0))")),
            ("060014002001", 40, None),
        ] {
            let mut feature = Feature::new(blocks.defn()).unwrap();
            if let Some(wkt) = wkt {
                feature.set_geometry(Geometry::from_wkt(wkt).unwrap()).unwrap();
            }
            feature.set_field_string(0, geoid).unwrap();
            feature.set_field_integer(1, pop).unwrap();
            feature.create(&blocks).unwrap();
        }

        let ages = dataset
            .create_layer(LayerOptions {
                name: "X01_AGE",
                ty: OGRwkbGeometryType::wkbNone,
                ..Default::default()
            })
            .unwrap();
        ages.create_defn_fields(&[("GEOID", OGRFieldType::OFTString), ("MEDIAN", OGRFieldType::OFTReal)])
            .unwrap();
        for (geoid, median) in [("060014001001", 1.0), ("060014001002", 35.5)] {
            let mut feature = Feature::new(ages.defn()).unwrap();
            feature.set_field_string(0, geoid).unwrap();
            feature.set_field_double(1, median).unwrap();
            feature.create(&ages).unwrap();
        }
    }

    #[test]
    fn test_extract_layers_from_multi_layer_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("acs.gpkg");
        write_source(&source);

        let options = ExtractOptions::new(&source, temp_dir.path().join("out"), "BLOCKGROUPS")
            .with_driver("GPKG");
        let exports = extract_layers(&options).unwrap();
        assert_eq!(exports.len(), 2);

        let blocks = exports.iter().find(|e| e.name == "BLOCKGROUPS").unwrap();
        assert_eq!(blocks.kind, LayerKind::Vector);
        assert_eq!(blocks.features, 3);
        assert_eq!(blocks.path, temp_dir.path().join("out").join("BLOCKGROUPS.shp"));

        let shapes = read_vector(&blocks.path).unwrap();
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes.crs.epsg, 4326);
        assert!(shapes.crs.wkt.as_deref().unwrap().contains("WGS"));
        assert!(shapes.features[2].geometry.is_none());
        assert_eq!(shapes.features[2].property_text("GEOID").as_deref(), Some("060014002001"));
        assert_eq!(shapes.features[0].property_text("POP").as_deref(), Some("1200"));

        let ages = exports.iter().find(|e| e.name == "X01_AGE").unwrap();
        assert_eq!(ages.kind, LayerKind::Tabular);
        assert_eq!(ages.features, 2);

        let csv = fs::read_to_string(&ages.path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![",GEOID,MEDIAN", "0,060014001001,1.0", "1,060014001002,35.5"]);
    }

    #[test]
    fn test_extract_overwrites_previous_run() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("acs.gpkg");
        write_source(&source);

        let options = ExtractOptions::new(&source, temp_dir.path().join("out"), "BLOCKGROUPS")
            .with_driver("GPKG");
        extract_layers(&options).unwrap();
        let exports = extract_layers(&options).unwrap();

        let blocks = exports.iter().find(|e| e.kind == LayerKind::Vector).unwrap();
        assert_eq!(read_vector(&blocks.path).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_geodatabase() {
        let temp_dir = tempfile::tempdir().unwrap();
        let options = ExtractOptions::new(
            temp_dir.path().join("missing.gdb"),
            temp_dir.path().join("out"),
            "BLOCKGROUPS",
        );

        assert_eq!(options.driver, GEOMETRY_LAYER_DRIVER);
        assert!(matches!(
            extract_layers(&options),
            Err(GeowrangleError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_field_value_text() {
        assert_eq!(field_value_text(FieldValue::StringValue("06".into())), "06");
        assert_eq!(field_value_text(FieldValue::IntegerValue(42)), "42");
        assert_eq!(field_value_text(FieldValue::RealValue(1.5)), "1.5");
        assert_eq!(field_value_text(FieldValue::RealValue(1.0)), "1.0");
        assert_eq!(
            field_value_text(FieldValue::StringListValue(vec!["a".into(), "b".into()])),
            "a;b"
        );
    }
}
