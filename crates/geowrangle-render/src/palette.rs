//! Layer colors

use geowrangle_core::{GeowrangleError, Result};
use plotters::style::RGBColor;

/// The 12-color "Paired" qualitative palette
pub const PAIRED: [RGBColor; 12] = [
    RGBColor(166, 206, 227),
    RGBColor(31, 120, 180),
    RGBColor(178, 223, 138),
    RGBColor(51, 160, 44),
    RGBColor(251, 154, 153),
    RGBColor(227, 26, 28),
    RGBColor(253, 191, 111),
    RGBColor(255, 127, 0),
    RGBColor(202, 178, 214),
    RGBColor(106, 61, 154),
    RGBColor(255, 255, 153),
    RGBColor(177, 89, 40),
];

/// Where each layer's color comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSource {
    /// Same color for every layer
    Fixed(RGBColor),
    /// Palette consumed round-robin, one color per layer
    Cycling(Vec<RGBColor>),
}

impl Default for ColorSource {
    fn default() -> Self {
        Self::paired()
    }
}

impl ColorSource {
    pub fn paired() -> Self {
        ColorSource::Cycling(PAIRED.to_vec())
    }

    /// Colors for `count` consecutive layers
    pub fn resolve(&self, count: usize) -> Result<Vec<RGBColor>> {
        match self {
            ColorSource::Fixed(color) => Ok(vec![*color; count]),
            ColorSource::Cycling(palette) if palette.is_empty() => {
                Err(GeowrangleError::Render("color palette is empty".to_string()))
            }
            ColorSource::Cycling(palette) => {
                Ok(palette.iter().cycle().take(count).copied().collect())
            }
        }
    }
}

/// Parse `#rrggbb` or `rrggbb`
pub fn parse_hex_color(value: &str) -> Result<RGBColor> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || GeowrangleError::ConfigInvalid {
        key: "color".to_string(),
        reason: format!("'{}' is not a #rrggbb color", value),
    };

    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
    };
    Ok(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycling_wraps_around() {
        let colors = ColorSource::paired().resolve(14).unwrap();
        assert_eq!(colors.len(), 14);
        assert_eq!(colors[0], PAIRED[0]);
        assert_eq!(colors[11], PAIRED[11]);
        assert_eq!(colors[12], PAIRED[0]);
        assert_eq!(colors[13], PAIRED[1]);
    }

    #[test]
    fn test_fixed_color() {
        let black = RGBColor(0, 0, 0);
        assert_eq!(ColorSource::Fixed(black).resolve(3).unwrap(), vec![black; 3]);
    }

    #[test]
    fn test_empty_palette() {
        assert!(ColorSource::Cycling(Vec::new()).resolve(1).is_err());
        assert!(ColorSource::Cycling(Vec::new()).resolve(0).is_err());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#1f78b4").unwrap(), RGBColor(31, 120, 180));
        assert_eq!(parse_hex_color("FFFFFF").unwrap(), RGBColor(255, 255, 255));
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }
}
