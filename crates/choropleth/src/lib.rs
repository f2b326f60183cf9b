//! Choropleth Color Mapping
//!
//! Linear count-to-color scale over `[0, maxCount]` between two fixed
//! stops, plus the outline/opacity styling a map renderer applies per
//! region.
//!
//! # Colors
//!
//! | Use | Color |
//! |-----|-------|
//! | Low end of scale | `#fee0d2` |
//! | High end of scale (`maxCount`) | `#de2d26` |
//! | No data / zero count | `#e0e0e0` |

use geo_resolver::RegionMatch;
use geojson::FeatureCollection;
use sample_records::CountrySummary;
use serde::{Serialize, Serializer};
use std::fmt;

pub mod style;

pub use style::{FeatureStyle, Legend};

pub const LOW_COLOR: Rgb = Rgb(0xfe, 0xe0, 0xd2);
pub const HIGH_COLOR: Rgb = Rgb(0xde, 0x2d, 0x26);
pub const NO_DATA_COLOR: Rgb = Rgb(0xe0, 0xe0, 0xe0);

/// 8-bit sRGB color, rendered as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
        let channel = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        Rgb(channel(a.0, b.0), channel(a.1, b.1), channel(a.2, b.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Continuous scale for one set of buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScale {
    max_count: usize,
    low: Rgb,
    high: Rgb,
}

impl ColorScale {
    /// Scale with domain `[0, max(max_count, 1)]`
    pub fn new(max_count: usize) -> Self {
        Self {
            max_count: max_count.max(1),
            low: LOW_COLOR,
            high: HIGH_COLOR,
        }
    }

    pub fn from_summary(summary: &CountrySummary) -> Self {
        Self::new(summary.max_count())
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Raw interpolation, `count` clamped to the domain
    pub fn interpolate(&self, count: usize) -> Rgb {
        let t = count.min(self.max_count) as f64 / self.max_count as f64;
        Rgb::lerp(self.low, self.high, t)
    }

    /// Fill color for a count; 0 means no data and gets the neutral gray
    pub fn color(&self, count: usize) -> Rgb {
        if count == 0 {
            NO_DATA_COLOR
        } else {
            self.interpolate(count)
        }
    }

    pub fn fill_for(&self, region: &RegionMatch) -> Rgb {
        if region.has_data {
            self.color(region.matched_count)
        } else {
            NO_DATA_COLOR
        }
    }

    pub fn legend(&self) -> Legend {
        Legend {
            min: 0,
            max: self.max_count,
            low_color: self.low,
            high_color: self.high,
            no_data_color: NO_DATA_COLOR,
        }
    }

    /// Write a `fillColor` property onto each feature.
    ///
    /// `regions` must be the match report for `features`, in the same order.
    pub fn paint(&self, features: &mut FeatureCollection, regions: &[RegionMatch]) {
        for (feature, region) in features.features.iter_mut().zip(regions) {
            feature.set_property("fillColor", self.fill_for(region).to_string());
        }
    }
}
