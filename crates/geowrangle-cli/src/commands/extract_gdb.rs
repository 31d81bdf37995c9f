//! Geodatabase extraction command implementation

use crate::cli::ExtractGdbArgs;
use crate::config_loader::load_config_with_overrides;
use crate::errors::explain;
use crate::output::OutputWriter;
use crate::output_types::ExtractOutput;
use anyhow::Result;
use geowrangle_core::config::CliConfigOverrides;
use geowrangle_core::geodatabase::{extract_layers, ExtractOptions, LayerKind};
use std::path::Path;
use tabled::Tabled;

pub fn execute(
    args: ExtractGdbArgs,
    config_path: Option<&Path>,
    output: &OutputWriter,
) -> Result<()> {
    let config = load_config_with_overrides(
        config_path,
        CliConfigOverrides {
            gdb_path: args.gdb,
            gdb_output_dir: args.output_dir,
            gdb_geometry_layer: args.geometry_layer,
            ..Default::default()
        },
    )?;

    let options = ExtractOptions::new(
        config.gdb_path.value,
        config.gdb_output_dir.value,
        config.gdb_geometry_layer.value,
    );
    let exports = extract_layers(&options).map_err(|e| explain(e, "extract-gdb"))?;

    if output.is_json() {
        output.result(ExtractOutput {
            gdb_path: options.gdb_path,
            output_dir: options.output_dir,
            layers: exports,
        })?;
        return Ok(());
    }

    output.section(format!("Layers of {}", options.gdb_path.display()));

    #[derive(Tabled)]
    struct LayerRow {
        #[tabled(rename = "Layer")]
        name: String,
        #[tabled(rename = "Kind")]
        kind: String,
        #[tabled(rename = "Rows")]
        features: usize,
        #[tabled(rename = "Output")]
        path: String,
    }

    let count = exports.len();
    let rows: Vec<LayerRow> = exports
        .into_iter()
        .map(|e| LayerRow {
            name: e.name,
            kind: match e.kind {
                LayerKind::Vector => "shapefile".to_string(),
                LayerKind::Tabular => "csv".to_string(),
            },
            features: e.features,
            path: e.path.display().to_string(),
        })
        .collect();
    output.table(rows);
    output.success(format!("Exported {} layers to {}", count, options.output_dir.display()));

    Ok(())
}
