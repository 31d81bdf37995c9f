//! Multi-band raster previews

use geowrangle_core::{GeowrangleError, Result};
use image::RgbImage;
use ndarray::{s, Array3};
use std::fs;
use std::ops::Range;
use std::path::Path;

/// Which three bands are shown as red, green and blue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandWindow {
    /// Bands 0, 1, 2
    Visible,
    /// Bands 1, 2, 3: drops the first band so near-infrared lands in blue
    Infrared,
}

impl BandWindow {
    pub fn from_infrared(infrared: bool) -> Self {
        if infrared {
            BandWindow::Infrared
        } else {
            BandWindow::Visible
        }
    }

    pub fn bands(&self) -> Range<usize> {
        match self {
            BandWindow::Visible => 0..3,
            BandWindow::Infrared => 1..4,
        }
    }
}

/// Decode an image into a `(row, col, band)` array of 8-bit samples.
///
/// Deeper samples are scaled down to 8 bits by the decoder.
pub fn read_bands(path: &Path) -> Result<Array3<u8>> {
    if !path.exists() {
        return Err(GeowrangleError::FileNotFound { path: path.to_path_buf() });
    }

    let decoded = image::open(path).map_err(|e| GeowrangleError::FormatError {
        format: "image".to_string(),
        message: format!("Failed to decode {}: {}", path.display(), e),
    })?;

    let (width, height) = (decoded.width() as usize, decoded.height() as usize);
    let bands = decoded.color().channel_count() as usize;
    let samples = match bands {
        1 => decoded.into_luma8().into_raw(),
        2 => decoded.into_luma_alpha8().into_raw(),
        3 => decoded.into_rgb8().into_raw(),
        _ => decoded.into_rgba8().into_raw(),
    };
    let bands = bands.min(4);

    tracing::debug!("Decoded {} as {}x{} with {} bands", path.display(), width, height, bands);

    Array3::from_shape_vec((height, width, bands), samples).map_err(|e| {
        GeowrangleError::FormatError {
            format: "image".to_string(),
            message: format!("Unexpected sample layout in {}: {}", path.display(), e),
        }
    })
}

/// Copy the three bands of `window` out of `array`
pub fn select_bands(array: &Array3<u8>, window: BandWindow, path: &Path) -> Result<Array3<u8>> {
    let found = array.dim().2;
    let bands = window.bands();
    if found < bands.end {
        return Err(GeowrangleError::InsufficientBands {
            path: path.to_path_buf(),
            found,
            required: bands.end,
        });
    }

    Ok(array.slice(s![.., .., bands]).to_owned())
}

/// Render three bands of the image at `path` as RGB, saving it when `save_path` is set
pub fn show_raster(path: &Path, save_path: Option<&Path>, infrared: bool) -> Result<RgbImage> {
    let window = BandWindow::from_infrared(infrared);
    let array = read_bands(path)?;
    let selected = select_bands(&array, window, path)?;

    let (height, width, _) = selected.dim();
    let samples: Vec<u8> = selected.iter().copied().collect();
    let rendered = RgbImage::from_raw(width as u32, height as u32, samples)
        .ok_or_else(|| GeowrangleError::Render("band window size mismatch".to_string()))?;

    if let Some(save_path) = save_path {
        if let Some(parent) = save_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        rendered.save(save_path).map_err(|e| {
            GeowrangleError::Render(format!("Failed to save {}: {}", save_path.display(), e))
        })?;
        tracing::info!("Saved {:?} band preview to {}", window, save_path.display());
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_band() -> Array3<u8> {
        Array3::from_shape_fn((2, 3, 4), |(row, col, band)| (row * 100 + col * 10 + band) as u8)
    }

    #[test]
    fn test_visible_window() {
        let selected = select_bands(&four_band(), BandWindow::Visible, Path::new("x.tif")).unwrap();
        assert_eq!(selected.dim(), (2, 3, 3));
        assert_eq!(selected[[1, 2, 0]], 120);
        assert_eq!(selected[[1, 2, 2]], 122);
    }

    #[test]
    fn test_infrared_window_drops_first_band() {
        let array = four_band();
        let selected = select_bands(&array, BandWindow::Infrared, Path::new("x.tif")).unwrap();
        assert_eq!(selected, array.slice(s![.., .., 1..4]).to_owned());
        assert_eq!(selected[[0, 1, 0]], 11);
    }

    #[test]
    fn test_insufficient_bands() {
        let rgb = Array3::<u8>::zeros((2, 2, 3));
        match select_bands(&rgb, BandWindow::Infrared, Path::new("rgb.png")) {
            Err(GeowrangleError::InsufficientBands { found, required, .. }) => {
                assert_eq!(found, 3);
                assert_eq!(required, 4);
            }
            other => panic!("expected InsufficientBands, got {:?}", other),
        }

        let gray = Array3::<u8>::zeros((2, 2, 1));
        assert!(select_bands(&gray, BandWindow::Visible, Path::new("gray.png")).is_err());
    }

    #[test]
    fn test_missing_image() {
        assert!(matches!(
            read_bands(Path::new("/nonexistent/scene.tif")),
            Err(GeowrangleError::FileNotFound { .. })
        ));
    }
}
