//! Geowrangle Render - Layer plots and raster previews
//!
//! Vector layers are drawn with plotters onto a single canvas; multi-band
//! images are decoded with the image crate into `(row, col, band)` arrays.

pub mod layers;
pub mod palette;
pub mod raster;
pub mod theme;

pub use layers::{plot_layers, PlotOutput, PlotSettings};
pub use palette::ColorSource;
pub use raster::{read_bands, select_bands, show_raster, BandWindow};
pub use theme::Theme;
