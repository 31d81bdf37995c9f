//! Layered vector plots

use geo::{Geometry, LineString, Rect, TriangulateEarcut};
use geowrangle_core::config::SaveFormat;
use geowrangle_core::{GeowrangleError, Result, VectorDataset};
use image::{ImageFormat, RgbImage};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::palette::ColorSource;
use crate::theme::Theme;

/// 40in x 40in at 100 dpi
pub const DEFAULT_CANVAS_SIZE: (u32, u32) = (4000, 4000);

type MapChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

#[derive(Debug, Clone)]
pub struct PlotSettings {
    /// Write the canvas here instead of returning it
    pub save_path: Option<PathBuf>,
    pub save_format: SaveFormat,
    pub edge_colors: ColorSource,
    pub fill_colors: ColorSource,
    pub theme: Theme,
    /// Canvas width and height in pixels
    pub size: (u32, u32),
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            save_path: None,
            save_format: SaveFormat::Png,
            edge_colors: ColorSource::paired(),
            fill_colors: ColorSource::paired(),
            theme: Theme::default(),
            size: DEFAULT_CANVAS_SIZE,
        }
    }
}

#[derive(Debug)]
pub enum PlotOutput {
    Saved { path: PathBuf, format: SaveFormat },
    Image(RgbImage),
}

/// Colors and stroke sizes for one layer
#[derive(Debug, Clone, Copy)]
struct LayerStyle {
    edge: RGBColor,
    fill: RGBColor,
    line_width: u32,
    point_radius: i32,
}

/// Draw every layer onto one canvas, in order, so later layers sit on top.
///
/// Layer `i` takes color `i` of both the edge and the fill source.
pub fn plot_layers(layers: &[VectorDataset], settings: &PlotSettings) -> Result<PlotOutput> {
    let (width, height) = settings.size;
    if width == 0 || height == 0 {
        return Err(GeowrangleError::Render(format!(
            "canvas size {}x{} is empty",
            width, height
        )));
    }

    let edges = settings.edge_colors.resolve(layers.len())?;
    let fills = settings.fill_colors.resolve(layers.len())?;
    let canvas = Canvas { layers, edges: &edges, fills: &fills, settings };

    let Some(path) = &settings.save_path else {
        return Ok(PlotOutput::Image(canvas.render_bitmap()?));
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    match settings.save_format {
        SaveFormat::Png => {
            canvas.render_bitmap()?.save_with_format(path, ImageFormat::Png).map_err(|e| {
                GeowrangleError::Render(format!("Failed to save {}: {}", path.display(), e))
            })?;
        }
        SaveFormat::Svg => canvas.render_svg(path)?,
    }

    tracing::info!("Saved {} layer plot to {}", layers.len(), path.display());
    Ok(PlotOutput::Saved { path: path.clone(), format: settings.save_format })
}

struct Canvas<'a> {
    layers: &'a [VectorDataset],
    edges: &'a [RGBColor],
    fills: &'a [RGBColor],
    settings: &'a PlotSettings,
}

impl Canvas<'_> {
    fn render_bitmap(&self) -> Result<RgbImage> {
        let (width, height) = self.settings.size;
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            self.draw(&root)?;
            root.present().map_err(render_error)?;
        }

        RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| GeowrangleError::Render("canvas buffer size mismatch".to_string()))
    }

    fn render_svg(&self, path: &Path) -> Result<()> {
        let root = SVGBackend::new(path, self.settings.size).into_drawing_area();
        self.draw(&root)?;
        root.present().map_err(render_error)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let background = self.settings.theme.background();
        root.fill(&background).map_err(render_error)?;

        let Some(extent) = extent(self.layers) else {
            tracing::debug!("Nothing to draw, canvas left blank");
            return Ok(());
        };

        let (x_range, y_range) = view_ranges(extent, self.settings.size);
        let mut chart = ChartBuilder::on(root)
            .build_cartesian_2d(x_range, y_range)
            .map_err(render_error)?;

        let scale = (self.settings.size.0.min(self.settings.size.1) / 1000).max(1);
        for (idx, layer) in self.layers.iter().enumerate() {
            let style = LayerStyle {
                edge: self.edges[idx],
                fill: self.fills[idx],
                line_width: scale,
                point_radius: 3 * scale as i32,
            };

            for geometry in layer.features.iter().filter_map(|f| f.geometry.as_ref()) {
                draw_geometry(&mut chart, geometry, &style)?;
            }
            tracing::debug!("Drew layer {} ({} features)", layer.name, layer.len());
        }

        Ok(())
    }
}

fn render_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> GeowrangleError {
    GeowrangleError::Render(err.to_string())
}

fn extent(layers: &[VectorDataset]) -> Option<Rect<f64>> {
    layers.iter().filter_map(VectorDataset::bounds).reduce(|a, b| {
        Rect::new(
            (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
            (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
        )
    })
}

/// Padded data window with the canvas aspect ratio, so shapes are not stretched
fn view_ranges(extent: Rect<f64>, size: (u32, u32)) -> (Range<f64>, Range<f64>) {
    let span = extent.width().max(extent.height());
    let pad = if span > 0.0 { span * 0.05 } else { 0.5 };

    let mut width = extent.width() + 2.0 * pad;
    let mut height = extent.height() + 2.0 * pad;
    let aspect = size.0 as f64 / size.1 as f64;
    if width / height > aspect {
        height = width / aspect;
    } else {
        width = height * aspect;
    }

    let center = extent.center();
    (
        center.x - width / 2.0..center.x + width / 2.0,
        center.y - height / 2.0..center.y + height / 2.0,
    )
}

fn ring_points(ring: &LineString<f64>) -> Vec<(f64, f64)> {
    ring.coords().map(|c| c.x_y()).collect()
}

fn draw_geometry<DB: DrawingBackend>(
    chart: &mut MapChart<'_, DB>,
    geometry: &Geometry<f64>,
    style: &LayerStyle,
) -> Result<()> {
    match geometry {
        Geometry::Point(p) => draw_point(chart, p.x_y(), style),
        Geometry::MultiPoint(mp) => {
            mp.iter().try_for_each(|p| draw_point(chart, p.x_y(), style))
        }
        Geometry::Line(l) => draw_path(chart, vec![l.start.x_y(), l.end.x_y()], style),
        Geometry::LineString(ls) => draw_path(chart, ring_points(ls), style),
        Geometry::MultiLineString(mls) => {
            mls.iter().try_for_each(|ls| draw_path(chart, ring_points(ls), style))
        }
        Geometry::Polygon(p) => draw_polygon(chart, p, style),
        Geometry::MultiPolygon(mp) => mp.iter().try_for_each(|p| draw_polygon(chart, p, style)),
        Geometry::Rect(r) => draw_polygon(chart, &r.to_polygon(), style),
        Geometry::Triangle(t) => draw_polygon(chart, &t.to_polygon(), style),
        Geometry::GeometryCollection(gc) => {
            gc.iter().try_for_each(|g| draw_geometry(chart, g, style))
        }
    }
}

fn draw_point<DB: DrawingBackend>(
    chart: &mut MapChart<'_, DB>,
    center: (f64, f64),
    style: &LayerStyle,
) -> Result<()> {
    chart
        .draw_series([
            Circle::new(center, style.point_radius, style.fill.filled()),
            Circle::new(center, style.point_radius, style.edge.stroke_width(style.line_width)),
        ])
        .map_err(render_error)?;
    Ok(())
}

fn draw_path<DB: DrawingBackend>(
    chart: &mut MapChart<'_, DB>,
    points: Vec<(f64, f64)>,
    style: &LayerStyle,
) -> Result<()> {
    chart
        .draw_series(std::iter::once(PathElement::new(
            points,
            style.edge.stroke_width(style.line_width),
        )))
        .map_err(render_error)?;
    Ok(())
}

/// Fill the polygon without covering its holes, then outline every ring
fn draw_polygon<DB: DrawingBackend>(
    chart: &mut MapChart<'_, DB>,
    polygon: &geo::Polygon<f64>,
    style: &LayerStyle,
) -> Result<()> {
    if polygon.interiors().is_empty() {
        chart
            .draw_series(std::iter::once(Polygon::new(
                ring_points(polygon.exterior()),
                style.fill.filled(),
            )))
            .map_err(render_error)?;
    } else {
        let triangles = polygon.earcut_triangles();
        chart
            .draw_series(triangles.iter().map(|t| {
                Polygon::new(t.to_array().map(|p| p.x_y()).to_vec(), style.fill.filled())
            }))
            .map_err(render_error)?;
        // Scanline fills leave hairline seams between neighbouring triangles
        chart
            .draw_series(triangles.iter().map(|t| {
                let [a, b, c] = t.to_array().map(|p| p.x_y());
                PathElement::new(vec![a, b, c, a], style.fill.stroke_width(1))
            }))
            .map_err(render_error)?;
    }

    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .try_for_each(|ring| draw_path(chart, ring_points(ring), style))
}
