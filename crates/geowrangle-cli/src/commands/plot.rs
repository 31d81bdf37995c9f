//! Plot command implementation

use crate::cli::PlotArgs;
use crate::config_loader::load_config_with_overrides;
use crate::errors::explain;
use crate::output::OutputWriter;
use crate::output_types::PlotOutputInfo;
use anyhow::{Context, Result};
use geowrangle_core::config::{parse_save_format, CliConfigOverrides};
use geowrangle_core::read_vector;
use geowrangle_render::palette::parse_hex_color;
use geowrangle_render::{plot_layers, ColorSource, PlotOutput, PlotSettings, Theme};
use std::path::Path;

pub fn execute(args: PlotArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let plot_format = args.format.as_deref().map(parse_save_format).transpose()?;
    let config = load_config_with_overrides(
        config_path,
        CliConfigOverrides { plot_format, ..Default::default() },
    )?;

    let color_source = |hex: Option<&str>| -> Result<ColorSource> {
        Ok(match hex {
            Some(hex) => ColorSource::Fixed(parse_hex_color(hex)?),
            None => ColorSource::paired(),
        })
    };

    let settings = PlotSettings {
        save_path: args.output.clone(),
        save_format: config.plot_format.value,
        edge_colors: color_source(args.edge_color.as_deref())?,
        fill_colors: color_source(args.fill_color.as_deref())?,
        theme: args.theme.parse::<Theme>()?,
        size: (args.size, args.size),
    };

    let layers = args
        .layers
        .iter()
        .map(|path| read_vector(path).map_err(|e| explain(e, "plot")))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let rendered = plot_layers(&layers, &settings).context("Failed to render layers")?;

    let (saved_to, format) = match &rendered {
        PlotOutput::Saved { path, format } => (Some(path.clone()), Some(format.extension())),
        PlotOutput::Image(_) => (None, None),
    };

    if output.is_json() {
        output.result(PlotOutputInfo {
            layers: layers.iter().map(|l| l.name.clone()).collect(),
            width: args.size,
            height: args.size,
            saved_to,
            format: format.map(str::to_string),
        })?;
        return Ok(());
    }

    match saved_to {
        Some(path) => output.success(format!(
            "Plotted {} layers to {}",
            layers.len(),
            path.display()
        )),
        None => output.info(format!(
            "Rendered {} layers on a {}x{} canvas; pass --output to save it",
            layers.len(),
            args.size,
            args.size
        )),
    }

    Ok(())
}
