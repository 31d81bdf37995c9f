//! Serializable payloads for `--json` output

use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct SubsetOutput {
    pub path: PathBuf,
    pub id_field: String,
    pub requested_ids: usize,
    pub features: usize,
    pub crs: String,
    pub geometry_type: String,
    pub written_to: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ClipOutput {
    pub output: PathBuf,
    pub strategy: Option<String>,
    pub features: Option<usize>,
    pub failures: Vec<ClipFailure>,
}

#[derive(Debug, Serialize)]
pub struct ClipFailure {
    pub strategy: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct PlotOutputInfo {
    pub layers: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub saved_to: Option<PathBuf>,
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub path: PathBuf,
    pub infrared: bool,
    pub width: u32,
    pub height: u32,
    pub saved_to: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}

#[cfg(feature = "gdb")]
#[derive(Debug, Serialize)]
pub struct ExtractOutput {
    pub gdb_path: PathBuf,
    pub output_dir: PathBuf,
    pub layers: Vec<geowrangle_core::geodatabase::LayerExport>,
}
