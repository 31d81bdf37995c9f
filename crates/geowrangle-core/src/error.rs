//! Error types for geowrangle

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeowrangleError {
    // Path errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    // Format errors
    #[error("Unsupported format '.{extension}'. Supported: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("{format} error: {message}")]
    FormatError { format: String, message: String },

    // Dataset errors
    #[error("Field '{field}' not found in dataset {dataset}")]
    FieldNotFound { field: String, dataset: String },

    #[error("Cannot overlay {dataset}: feature {feature_index} is a {geometry_type}, only polygons are supported")]
    MixedGeometry {
        dataset: String,
        feature_index: usize,
        geometry_type: String,
    },

    // Raster errors
    #[error("Image {path} has {found} bands, at least {required} needed")]
    InsufficientBands {
        path: PathBuf,
        found: usize,
        required: usize,
    },

    #[error("Render error: {0}")]
    Render(String),

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, GeowrangleError>;
