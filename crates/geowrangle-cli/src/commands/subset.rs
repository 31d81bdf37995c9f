//! Subset command implementation

use crate::cli::SubsetArgs;
use crate::config_loader::load_config_with_overrides;
use crate::errors::explain;
use crate::output::OutputWriter;
use crate::output_types::SubsetOutput;
use anyhow::Result;
use geowrangle_core::config::CliConfigOverrides;
use geowrangle_core::write_vector;
use geowrangle_geo::load_subset;
use std::path::Path;

pub fn execute(args: SubsetArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config_with_overrides(
        config_path,
        CliConfigOverrides { subset_id_field: args.id_field, ..Default::default() },
    )?;
    let id_field = config.subset_id_field.value;

    let subset = load_subset(&args.path, &args.ids, &id_field).map_err(|e| explain(e, "subset"))?;

    if let Some(out_path) = &args.output {
        write_vector(&subset, out_path).map_err(|e| explain(e, "subset"))?;
    }

    if output.is_json() {
        output.result(SubsetOutput {
            path: args.path,
            id_field,
            requested_ids: args.ids.len(),
            features: subset.len(),
            crs: subset.crs.authority(),
            geometry_type: subset.geometry_type().to_string(),
            written_to: args.output,
        })?;
        return Ok(());
    }

    if args.ids.is_empty() {
        output.success(format!("Loaded {} features from {}", subset.len(), args.path.display()));
    } else {
        output.success(format!(
            "Kept {} features of {} matching {} {} value(s)",
            subset.len(),
            args.path.display(),
            args.ids.len(),
            id_field
        ));
    }
    output.kv("CRS", format!("{} ({})", subset.crs.authority(), subset.crs.name));
    output.kv("Geometry", subset.geometry_type());
    if let Some(out_path) = &args.output {
        output.kv("Written to", out_path.display());
    }

    Ok(())
}
