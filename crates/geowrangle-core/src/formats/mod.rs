//! Vector format layer
//!
//! Each on-disk format implements [`VectorFormat`], and the [`FormatRegistry`]
//! picks the implementation from the file extension.

use std::path::Path;

use crate::error::{GeowrangleError, Result};
use crate::models::VectorDataset;

pub mod geojson;
pub mod shapefile;

#[cfg(feature = "gdb")]
pub mod gdal_utils;

/// Reader/writer pair for one vector file format
pub trait VectorFormat {
    /// Read the whole dataset at `path`
    fn read(&self, path: &Path) -> Result<VectorDataset>;

    /// Write `dataset` to `path`, replacing any existing file
    fn write(&self, dataset: &VectorDataset, path: &Path) -> Result<()>;

    /// Supported file extensions (e.g., ["shp"])
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable format name (e.g., "Shapefile")
    fn format_name(&self) -> &str;
}

/// Central registry for vector formats
pub struct FormatRegistry {
    formats: Vec<Box<dyn VectorFormat>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { formats: Vec::new() }
    }

    /// Registry with the Shapefile and GeoJSON formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(shapefile::ShapefileFormat));
        registry.register(Box::new(geojson::GeoJsonFormat));
        registry
    }

    pub fn register(&mut self, format: Box<dyn VectorFormat>) {
        self.formats.push(format);
    }

    /// Detect format from the path extension
    pub fn detect_format(&self, path: &Path) -> Result<&dyn VectorFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| GeowrangleError::UnsupportedFormat {
                extension: "none".to_string(),
                supported: self.supported_formats(),
            })?;

        self.formats
            .iter()
            .find(|f| {
                f.supported_extensions()
                    .iter()
                    .any(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .map(|f| f.as_ref())
            .ok_or_else(|| GeowrangleError::UnsupportedFormat {
                extension: extension.to_string(),
                supported: self.supported_formats(),
            })
    }

    /// All supported extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.formats
            .iter()
            .flat_map(|f| f.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Read a vector dataset, choosing the format from the extension
pub fn read_vector(path: &Path) -> Result<VectorDataset> {
    let registry = FormatRegistry::with_defaults();
    let format = registry.detect_format(path)?;
    tracing::debug!("Reading {} as {}", path.display(), format.format_name());
    format.read(path)
}

/// Write a vector dataset, choosing the format from the extension
pub fn write_vector(dataset: &VectorDataset, path: &Path) -> Result<()> {
    let registry = FormatRegistry::with_defaults();
    let format = registry.detect_format(path)?;
    tracing::info!(
        "Writing {} features to {} ({})",
        dataset.len(),
        path.display(),
        format.format_name()
    );
    format.write(dataset, path)
}

/// Dataset name taken from the file stem
pub(crate) fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formats() {
        let registry = FormatRegistry::with_defaults();
        assert_eq!(registry.supported_formats(), vec!["shp", "geojson", "json"]);
    }

    #[test]
    fn test_format_detection() {
        let registry = FormatRegistry::with_defaults();

        let format = registry.detect_format(Path::new("roads.shp")).unwrap();
        assert_eq!(format.format_name(), "Shapefile");

        let format = registry.detect_format(Path::new("aoi.GeoJSON")).unwrap();
        assert_eq!(format.format_name(), "GeoJSON");
    }

    #[test]
    fn test_unsupported_format() {
        let registry = FormatRegistry::with_defaults();
        assert!(matches!(
            registry.detect_format(Path::new("layer.gpkg")),
            Err(GeowrangleError::UnsupportedFormat { .. })
        ));
        assert!(registry.detect_format(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_empty_registry() {
        let registry = FormatRegistry::new();
        assert!(registry.supported_formats().is_empty());
    }
}
