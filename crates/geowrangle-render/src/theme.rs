//! Canvas themes

use geowrangle_core::{GeowrangleError, Result};
use plotters::style::RGBColor;
use std::str::FromStr;

/// Seaborn-style figure themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    WhiteGrid,
    DarkGrid,
    White,
    Dark,
    Ticks,
}

impl Theme {
    pub fn background(&self) -> RGBColor {
        match self {
            Theme::WhiteGrid | Theme::White | Theme::Ticks => RGBColor(255, 255, 255),
            Theme::DarkGrid | Theme::Dark => RGBColor(234, 234, 242),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::WhiteGrid => "whitegrid",
            Theme::DarkGrid => "darkgrid",
            Theme::White => "white",
            Theme::Dark => "dark",
            Theme::Ticks => "ticks",
        }
    }
}

impl FromStr for Theme {
    type Err = GeowrangleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "whitegrid" => Ok(Theme::WhiteGrid),
            "darkgrid" => Ok(Theme::DarkGrid),
            "white" => Ok(Theme::White),
            "dark" => Ok(Theme::Dark),
            "ticks" => Ok(Theme::Ticks),
            other => Err(GeowrangleError::ConfigInvalid {
                key: "theme".to_string(),
                reason: format!(
                    "unknown theme '{}', expected whitegrid, darkgrid, white, dark or ticks",
                    other
                ),
            }),
        }
    }
}
