//! Show command implementation

use crate::cli::ShowArgs;
use crate::errors::explain;
use crate::output::OutputWriter;
use crate::output_types::ShowOutput;
use anyhow::Result;
use geowrangle_render::show_raster;

pub fn execute(args: ShowArgs, output: &OutputWriter) -> Result<()> {
    let preview = show_raster(&args.path, args.output.as_deref(), args.infrared)
        .map_err(|e| explain(e, "show"))?;
    let (width, height) = preview.dimensions();

    if output.is_json() {
        output.result(ShowOutput {
            path: args.path,
            infrared: args.infrared,
            width,
            height,
            saved_to: args.output,
        })?;
        return Ok(());
    }

    let window = if args.infrared { "bands 2-4" } else { "bands 1-3" };
    match &args.output {
        Some(path) => output.success(format!(
            "Saved {}x{} preview of {} ({}) to {}",
            width,
            height,
            args.path.display(),
            window,
            path.display()
        )),
        None => output.info(format!(
            "Rendered {}x{} preview of {} ({}); pass --output to save it",
            width,
            height,
            args.path.display(),
            window
        )),
    }

    Ok(())
}
