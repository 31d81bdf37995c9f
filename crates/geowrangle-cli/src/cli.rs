use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Geowrangle - Geospatial data wrangling helpers
#[derive(Parser, Debug)]
#[command(name = "geowrangle")]
#[command(about = "Subset, clip, plot and extract geospatial datasets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a vector dataset, keeping only the listed identifiers
    Subset(SubsetArgs),

    /// Clip a dataset to an area of interest and save the result
    Clip(ClipArgs),

    /// Draw vector layers onto one canvas
    Plot(PlotArgs),

    /// Export every layer of a file geodatabase
    #[cfg(feature = "gdb")]
    ExtractGdb(ExtractGdbArgs),

    /// Preview three bands of a multi-band image
    Show(ShowArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct SubsetArgs {
    /// Vector dataset (Shapefile or GeoJSON)
    pub path: PathBuf,

    /// Identifier to keep; repeat for several. Omit to keep every row
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Identifier column
    #[arg(long)]
    pub id_field: Option<String>,

    /// Write the subset here (.shp, .geojson or .json)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ClipArgs {
    /// Area of interest
    pub aoi: PathBuf,

    /// Dataset to trim
    pub shape: PathBuf,

    /// Where the derived dataset is written
    pub output: PathBuf,

    /// Select rows by spatial join instead of intersecting geometries
    #[arg(long)]
    pub join: bool,

    /// Identifier column used by the spatial join
    #[arg(long)]
    pub id_field: Option<String>,
}

#[derive(Parser, Debug)]
pub struct PlotArgs {
    /// Layers, drawn in order
    #[arg(required = true)]
    pub layers: Vec<PathBuf>,

    /// Save the canvas here
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Image format (png or svg)
    #[arg(long)]
    pub format: Option<String>,

    /// One edge color (#rrggbb) for every layer instead of the palette
    #[arg(long, value_name = "HEX")]
    pub edge_color: Option<String>,

    /// One fill color (#rrggbb) for every layer instead of the palette
    #[arg(long, value_name = "HEX")]
    pub fill_color: Option<String>,

    /// Canvas theme (whitegrid, darkgrid, white, dark, ticks)
    #[arg(long, default_value = "whitegrid")]
    pub theme: String,

    /// Canvas width and height in pixels
    #[arg(long, default_value = "4000")]
    pub size: u32,
}

#[cfg(feature = "gdb")]
#[derive(Parser, Debug)]
pub struct ExtractGdbArgs {
    /// File geodatabase directory
    #[arg(long)]
    pub gdb: Option<PathBuf>,

    /// Directory receiving the Shapefile and CSV outputs
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Layer exported with its geometry
    #[arg(long)]
    pub geometry_layer: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Image to preview
    pub path: PathBuf,

    /// Show bands 2-4 instead of 1-3
    #[arg(long)]
    pub infrared: bool,

    /// Save the preview here
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}
