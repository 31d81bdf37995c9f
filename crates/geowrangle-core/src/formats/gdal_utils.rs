//! GDAL utility functions and error handling helpers

use crate::error::GeowrangleError;
use gdal::errors::GdalError;
use gdal::vector::LayerAccess;
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use std::path::Path;

/// Convert GDAL errors to geowrangle errors with context
pub fn convert_gdal_error(err: GdalError, context: &str) -> GeowrangleError {
    GeowrangleError::FormatError {
        format: "GDAL".to_string(),
        message: format!("{}: {}", context, err),
    }
}

/// Verify that a dataset path exists; file geodatabases are directories
pub fn verify_path_exists(path: &Path) -> Result<(), GeowrangleError> {
    if !path.exists() {
        return Err(GeowrangleError::FileNotFound { path: path.to_path_buf() });
    }
    Ok(())
}

/// Open a vector dataset with any driver GDAL picks
pub fn open_vector(path: &Path) -> Result<Dataset, GeowrangleError> {
    Dataset::open(path)
        .map_err(|e| convert_gdal_error(e, &format!("Failed to open {}", path.display())))
}

/// Open a vector dataset restricted to a single driver
pub fn open_vector_with_driver(path: &Path, driver: &str) -> Result<Dataset, GeowrangleError> {
    let options = DatasetOptions {
        open_flags: GdalOpenFlags::GDAL_OF_VECTOR,
        allowed_drivers: Some(&[driver]),
        ..Default::default()
    };

    Dataset::open_ex(path, options).map_err(|e| {
        convert_gdal_error(e, &format!("Failed to open {} with {}", path.display(), driver))
    })
}

/// Get layer names from a GDAL dataset
pub fn get_layer_names(path: &Path) -> Result<Vec<String>, GeowrangleError> {
    verify_path_exists(path)?;
    let dataset = open_vector(path)?;
    Ok(dataset.layers().map(|layer| layer.name()).collect())
}
