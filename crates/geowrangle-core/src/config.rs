use crate::error::{GeowrangleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Identifier column used when subsetting ZCTA (zipcode) shapefiles
pub const DEFAULT_SUBSET_ID_FIELD: &str = "ZCTA5CE10";

/// Identifier column used to match OpenStreetMap extracts in overlap joins
pub const DEFAULT_JOIN_ID_FIELD: &str = "osm_id";

pub const DEFAULT_GDB_PATH: &str = "./data/2016blockgroupca.gdb";
pub const DEFAULT_GDB_OUTPUT_DIR: &str = "./data/ACS2016";
pub const DEFAULT_GDB_GEOMETRY_LAYER: &str = "ACS_2016_5YR_BG_06_CALIFORNIA";

/// Layer a configuration value was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    /// TOML file
    File,
    /// `GEOWRANGLE_*` variable
    Environment,
    /// Command-line flag
    Cli,
}

impl ConfigSource {
    /// Later layers win: default < file < environment < CLI
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// Value paired with the layer that set it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Replace the value only when `source` outranks the current one
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Output format for rendered canvases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Png,
    Svg,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Svg => "svg",
        }
    }
}

/// Layered configuration for geowrangle
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub subset_id_field: ConfigValue<String>,
    pub join_id_field: ConfigValue<String>,
    pub gdb_path: ConfigValue<PathBuf>,
    pub gdb_output_dir: ConfigValue<PathBuf>,
    pub gdb_geometry_layer: ConfigValue<String>,
    pub plot_format: ConfigValue<SaveFormat>,
}

impl LayeredConfig {
    /// Built-in defaults for every key
    pub fn with_defaults() -> Self {
        Self {
            subset_id_field: ConfigValue::new(
                DEFAULT_SUBSET_ID_FIELD.to_string(),
                ConfigSource::Default,
            ),
            join_id_field: ConfigValue::new(DEFAULT_JOIN_ID_FIELD.to_string(), ConfigSource::Default),
            gdb_path: ConfigValue::new(PathBuf::from(DEFAULT_GDB_PATH), ConfigSource::Default),
            gdb_output_dir: ConfigValue::new(
                PathBuf::from(DEFAULT_GDB_OUTPUT_DIR),
                ConfigSource::Default,
            ),
            gdb_geometry_layer: ConfigValue::new(
                DEFAULT_GDB_GEOMETRY_LAYER.to_string(),
                ConfigSource::Default,
            ),
            plot_format: ConfigValue::new(SaveFormat::Png, ConfigSource::Default),
        }
    }

    /// Overlay keys present in a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeowrangleError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeowrangleError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(field) = file_config.subset_id_field {
            self.subset_id_field.update(field, ConfigSource::File);
        }
        if let Some(field) = file_config.join_id_field {
            self.join_id_field.update(field, ConfigSource::File);
        }
        if let Some(path) = file_config.gdb_path {
            self.gdb_path.update(path, ConfigSource::File);
        }
        if let Some(dir) = file_config.gdb_output_dir {
            self.gdb_output_dir.update(dir, ConfigSource::File);
        }
        if let Some(layer) = file_config.gdb_geometry_layer {
            self.gdb_geometry_layer.update(layer, ConfigSource::File);
        }
        if let Some(format) = file_config.plot_format {
            self.plot_format.update(format, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from `GEOWRANGLE_*` environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(field) = env::var("GEOWRANGLE_SUBSET_ID_FIELD") {
            self.subset_id_field.update(field, ConfigSource::Environment);
        }

        if let Ok(field) = env::var("GEOWRANGLE_JOIN_ID_FIELD") {
            self.join_id_field.update(field, ConfigSource::Environment);
        }

        if let Ok(path) = env::var("GEOWRANGLE_GDB_PATH") {
            self.gdb_path.update(PathBuf::from(path), ConfigSource::Environment);
        }

        if let Ok(dir) = env::var("GEOWRANGLE_GDB_OUTPUT_DIR") {
            self.gdb_output_dir.update(PathBuf::from(dir), ConfigSource::Environment);
        }

        if let Ok(layer) = env::var("GEOWRANGLE_GDB_GEOMETRY_LAYER") {
            self.gdb_geometry_layer.update(layer, ConfigSource::Environment);
        }

        if let Ok(format_str) = env::var("GEOWRANGLE_PLOT_FORMAT") {
            match parse_save_format(&format_str) {
                Ok(format) => self.plot_format.update(format, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOWRANGLE_PLOT_FORMAT value '{}': expected png or svg",
                    format_str
                ),
            }
        }

        self
    }

    /// Apply flags given on the command line
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(field) = overrides.subset_id_field {
            self.subset_id_field.update(field, ConfigSource::Cli);
        }
        if let Some(field) = overrides.join_id_field {
            self.join_id_field.update(field, ConfigSource::Cli);
        }
        if let Some(path) = overrides.gdb_path {
            self.gdb_path.update(path, ConfigSource::Cli);
        }
        if let Some(dir) = overrides.gdb_output_dir {
            self.gdb_output_dir.update(dir, ConfigSource::Cli);
        }
        if let Some(layer) = overrides.gdb_geometry_layer {
            self.gdb_geometry_layer.update(layer, ConfigSource::Cli);
        }
        if let Some(format) = overrides.plot_format {
            self.plot_format.update(format, ConfigSource::Cli);
        }
    }

    /// Flatten to `key -> (rendered value, source)` for `geowrangle config`
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "subset_id_field".to_string(),
            (self.subset_id_field.value.clone(), self.subset_id_field.source),
        );
        map.insert(
            "join_id_field".to_string(),
            (self.join_id_field.value.clone(), self.join_id_field.source),
        );
        map.insert(
            "gdb_path".to_string(),
            (self.gdb_path.value.display().to_string(), self.gdb_path.source),
        );
        map.insert(
            "gdb_output_dir".to_string(),
            (self.gdb_output_dir.value.display().to_string(), self.gdb_output_dir.source),
        );
        map.insert(
            "gdb_geometry_layer".to_string(),
            (self.gdb_geometry_layer.value.clone(), self.gdb_geometry_layer.source),
        );
        map.insert(
            "plot_format".to_string(),
            (self.plot_format.value.extension().to_string(), self.plot_format.source),
        );

        map
    }
}

/// On-disk layout of `geowrangle.toml`; every key optional
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    subset_id_field: Option<String>,
    join_id_field: Option<String>,
    gdb_path: Option<PathBuf>,
    gdb_output_dir: Option<PathBuf>,
    gdb_geometry_layer: Option<String>,
    plot_format: Option<SaveFormat>,
}

/// Values supplied through command-line flags
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub subset_id_field: Option<String>,
    pub join_id_field: Option<String>,
    pub gdb_path: Option<PathBuf>,
    pub gdb_output_dir: Option<PathBuf>,
    pub gdb_geometry_layer: Option<String>,
    pub plot_format: Option<SaveFormat>,
}

/// Parse a canvas save format from string
pub fn parse_save_format(s: &str) -> Result<SaveFormat> {
    match s.trim_start_matches('.').to_lowercase().as_str() {
        "png" => Ok(SaveFormat::Png),
        "svg" => Ok(SaveFormat::Svg),
        _ => Err(GeowrangleError::ConfigInvalid {
            key: "plot_format".to_string(),
            reason: format!("Invalid save format: {}. Use png or svg", s),
        }),
    }
}
