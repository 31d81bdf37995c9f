//! Clip command implementation

use crate::cli::ClipArgs;
use crate::config_loader::load_config_with_overrides;
use crate::errors::{explain, CliError};
use crate::output::OutputWriter;
use crate::output_types::{ClipFailure, ClipOutput};
use anyhow::Result;
use geowrangle_core::config::CliConfigOverrides;
use geowrangle_core::read_vector;
use geowrangle_geo::{clip_or_join, ClipOptions, ClipOutcome};
use std::path::Path;

pub fn execute(args: ClipArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config_with_overrides(
        config_path,
        CliConfigOverrides { join_id_field: args.id_field, ..Default::default() },
    )?;

    let aoi = read_vector(&args.aoi).map_err(|e| explain(e, "clip"))?;
    let shape = read_vector(&args.shape).map_err(|e| explain(e, "clip"))?;
    if aoi.crs.epsg != shape.crs.epsg {
        output.warning(format!(
            "{} is {} but {} is {}; geometries are compared as-is",
            aoi.name,
            aoi.crs.authority(),
            shape.name,
            shape.crs.authority()
        ));
    }

    let options = ClipOptions { intersect: !args.join, id_field: config.join_id_field.value };
    let outcome = clip_or_join(&aoi, &shape, &args.output, &options);

    if output.is_json() {
        output.result(clip_output(&args.output, &outcome))?;
    }

    match outcome {
        ClipOutcome::Written { strategy, features, path } => {
            if !output.is_json() {
                output.success(format!(
                    "Wrote {} features to {} ({})",
                    features,
                    path.display(),
                    strategy
                ));
            }
            Ok(())
        }
        ClipOutcome::Failed { attempts } => {
            let mut err = CliError::new(format!("Could not write {}", args.output.display()))
                .with_help("Run: geowrangle clip --help");
            for attempt in &attempts {
                err = err.with_suggestion(format!("{} failed: {}", attempt.strategy, attempt.error));
            }
            Err(err.into())
        }
    }
}

fn clip_output(path: &Path, outcome: &ClipOutcome) -> ClipOutput {
    match outcome {
        ClipOutcome::Written { strategy, features, .. } => ClipOutput {
            output: path.to_path_buf(),
            strategy: Some(strategy.to_string()),
            features: Some(*features),
            failures: Vec::new(),
        },
        ClipOutcome::Failed { attempts } => ClipOutput {
            output: path.to_path_buf(),
            strategy: None,
            features: None,
            failures: attempts
                .iter()
                .map(|a| ClipFailure { strategy: a.strategy.to_string(), error: a.error.to_string() })
                .collect(),
        },
    }
}
