//! Per-region path styling and the map legend

use crate::{ColorScale, Rgb};
use geo_resolver::RegionMatch;
use serde::Serialize;

const OUTLINE_SELECTED: Rgb = Rgb(0x00, 0x00, 0x00);
const OUTLINE_HOVERED: Rgb = Rgb(0x1e, 0x40, 0xaf);
const OUTLINE_DEFAULT: Rgb = Rgb(0x66, 0x66, 0x66);

/// Path options for one region polygon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub fill_color: Rgb,
    /// Outline width in pixels
    pub weight: u8,
    pub color: Rgb,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl FeatureStyle {
    /// Selection outranks hover for outline color and width
    pub fn for_region(scale: &ColorScale, region: &RegionMatch, hovered: bool, selected: bool) -> Self {
        let (weight, color) = if selected {
            (3, OUTLINE_SELECTED)
        } else if hovered {
            (2, OUTLINE_HOVERED)
        } else {
            (1, OUTLINE_DEFAULT)
        };

        Self {
            fill_color: scale.fill_for(region),
            weight,
            color,
            opacity: 1.0,
            fill_opacity: if hovered { 0.9 } else { 0.7 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub min: usize,
    pub max: usize,
    pub low_color: Rgb,
    pub high_color: Rgb,
    pub no_data_color: Rgb,
}
