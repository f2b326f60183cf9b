//! Geo Resolver
//!
//! Joins per-country sample buckets onto a GeoJSON region layer whose
//! naming conventions are its own:
//!
//! - each feature is named by its primary name property, falling back to a
//!   secondary one (`name_en`, then `name` by default)
//! - names match bucket countries by exact equality after case folding,
//!   with no aliases and no fuzzy matching
//! - bucket countries with no matching region (other than the "Unknown" /
//!   "missing" placeholders) are reported as unmatched
//!
//! The source collection is only read. Enrichment builds a new collection
//! whose feature properties gain `displayName`, `matchedCount` and
//! `hasData`.

use geojson::{Feature, FeatureCollection};
use sample_records::{fold_country, is_sentinel, CountrySummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

pub mod loader;
pub mod lookup;

pub use loader::{load_geometry_file, parse_geometry};
pub use lookup::CountryLookup;

/// Default primary name property
pub const PRIMARY_NAME_PROPERTY: &str = "name_en";

/// Default fallback name property
pub const FALLBACK_NAME_PROPERTY: &str = "name";

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GeoJSON parse error: {0}")]
    Parse(#[from] geojson::Error),
    #[error("Expected a FeatureCollection, found a {0}")]
    NotACollection(&'static str),
}

pub type Result<T> = std::result::Result<T, GeometryError>;

/// Which feature properties name a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFields {
    pub primary: String,
    pub fallback: String,
}

impl Default for NameFields {
    fn default() -> Self {
        Self {
            primary: PRIMARY_NAME_PROPERTY.to_string(),
            fallback: FALLBACK_NAME_PROPERTY.to_string(),
        }
    }
}

/// Match outcome for one feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMatch {
    pub display_name: Option<String>,
    /// Bucket count when matched, else 0
    pub matched_count: usize,
    pub has_data: bool,
}

/// Enriched geometry plus match report
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub features: FeatureCollection,
    /// One entry per feature, same order as `features.features`
    pub regions: Vec<RegionMatch>,
    /// Bucket countries with no region, original case, bucket order
    pub unmatched: Vec<String>,
}

impl Resolution {
    /// Region whose display name equals `name` exactly
    pub fn region_named(&self, name: &str) -> Option<&RegionMatch> {
        self.regions
            .iter()
            .find(|r| r.display_name.as_deref() == Some(name))
    }

    pub fn matched_regions(&self) -> usize {
        self.regions.iter().filter(|r| r.has_data).count()
    }

    /// Banner text listing unmatched countries, if there are any
    pub fn warning_message(&self) -> Option<String> {
        if self.unmatched.is_empty() {
            return None;
        }
        Some(format!(
            "The following countries from the dataset could not be matched to the map: {}",
            self.unmatched.join(", ")
        ))
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeoResolver {
    names: NameFields,
}

impl GeoResolver {
    pub fn new(names: NameFields) -> Self {
        Self { names }
    }

    pub fn name_fields(&self) -> &NameFields {
        &self.names
    }

    /// Primary name if present and non-empty, else fallback name
    pub fn display_name<'a>(&self, feature: &'a Feature) -> Option<&'a str> {
        let named = move |key: &str| {
            feature
                .property(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };
        named(&self.names.primary).or_else(|| named(&self.names.fallback))
    }

    /// Join `summary` onto `geometry`
    pub fn resolve(&self, summary: &CountrySummary, geometry: &FeatureCollection) -> Resolution {
        let buckets = summary.buckets();
        let lookup = CountryLookup::build(buckets);
        if lookup.is_empty() {
            debug!("No country buckets, every region resolves without data");
        }

        let mut features = geometry.clone();
        let mut regions = Vec::with_capacity(features.features.len());
        let mut region_names: HashSet<String> = HashSet::new();

        for feature in features.features.iter_mut() {
            let display_name = self.display_name(feature).map(str::to_string);
            let bucket = display_name
                .as_deref()
                .and_then(|name| lookup.get(buckets, name));

            let region = RegionMatch {
                matched_count: bucket.map(|b| b.count).unwrap_or(0),
                has_data: bucket.is_some(),
                display_name,
            };

            if let Some(name) = &region.display_name {
                region_names.insert(fold_country(name));
                feature.set_property("displayName", name.clone());
            }
            feature.set_property("matchedCount", region.matched_count);
            feature.set_property("hasData", region.has_data);

            regions.push(region);
        }

        let unmatched: Vec<String> = buckets
            .iter()
            .filter(|b| !is_sentinel(&b.country))
            .filter(|b| !region_names.contains(&fold_country(&b.country)))
            .map(|b| b.country.clone())
            .collect();

        let resolution = Resolution {
            features,
            regions,
            unmatched,
        };

        info!(
            "Resolved {} buckets ({} distinct names) against {} regions: {} regions with data, {} countries unmatched",
            buckets.len(),
            lookup.len(),
            resolution.regions.len(),
            resolution.matched_regions(),
            resolution.unmatched.len()
        );
        if !resolution.unmatched.is_empty() {
            debug!("Unmatched countries: {:?}", resolution.unmatched);
        }

        resolution
    }
}
