//! Sample Records Library
//!
//! Row model for tab-separated sample metadata exports, the TSV parsing
//! boundary, and grouping of rows into per-country buckets.
//!
//! Country names are stored exactly as they appear in the data. Folding to
//! lower case happens only when a comparison needs it (geometry matching,
//! sentinel filtering), never on the stored value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod aggregate;
pub mod table;
pub mod tsv;

pub use aggregate::{aggregate, CountryBucket, CountrySummary, CountryTally};
pub use table::{TableRow, DEFAULT_SEQUENCE_BASE_URL, NOT_AVAILABLE};
pub use tsv::{parse_tsv, ParseWarning, ParsedTable};

/// Bucket name for rows without a country value
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Folded country values that never count as a real country
pub const SENTINEL_COUNTRIES: [&str; 2] = ["unknown", "missing"];

/// Column names with a typed slot on [`SampleRecord`]
pub const KNOWN_FIELDS: [&str; 9] = [
    "accessionVersion",
    "insdcAccessionFull",
    "sampleCollectionDate",
    "geoLocCountry",
    "geoLocAdmin1",
    "geoLocAdmin2",
    "geoLocCity",
    "hostNameScientific",
    "authors",
];

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Unreadable header line: {0}")]
    Header(String),
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// One sample row.
///
/// The columns the application reads are typed fields; every other
/// header-derived column lands in `extra`. Serializes as a single flat
/// object keyed by the original column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insdc_accession_full: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_collection_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_loc_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_loc_admin1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_loc_admin2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_loc_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name_scientific: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,

    /// Columns outside [`KNOWN_FIELDS`]
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl SampleRecord {
    /// Build a record from `(column, value)` pairs
    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::default();
        for (name, value) in fields {
            record.set(name.as_ref(), value);
        }
        record
    }

    /// Set a column value. Empty values are treated as absent.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }

        match self.slot_mut(name) {
            Some(slot) => *slot = Some(value),
            None => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    /// Look up a column by its original name
    pub fn get(&self, name: &str) -> Option<&str> {
        let known = match name {
            "accessionVersion" => &self.accession_version,
            "insdcAccessionFull" => &self.insdc_accession_full,
            "sampleCollectionDate" => &self.sample_collection_date,
            "geoLocCountry" => &self.geo_loc_country,
            "geoLocAdmin1" => &self.geo_loc_admin1,
            "geoLocAdmin2" => &self.geo_loc_admin2,
            "geoLocCity" => &self.geo_loc_city,
            "hostNameScientific" => &self.host_name_scientific,
            "authors" => &self.authors,
            other => return self.extra.get(other).map(String::as_str),
        };
        known.as_deref()
    }

    /// Country value, if present and non-empty
    pub fn country(&self) -> Option<&str> {
        self.geo_loc_country.as_deref().filter(|c| !c.is_empty())
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "accessionVersion" => Some(&mut self.accession_version),
            "insdcAccessionFull" => Some(&mut self.insdc_accession_full),
            "sampleCollectionDate" => Some(&mut self.sample_collection_date),
            "geoLocCountry" => Some(&mut self.geo_loc_country),
            "geoLocAdmin1" => Some(&mut self.geo_loc_admin1),
            "geoLocAdmin2" => Some(&mut self.geo_loc_admin2),
            "geoLocCity" => Some(&mut self.geo_loc_city),
            "hostNameScientific" => Some(&mut self.host_name_scientific),
            "authors" => Some(&mut self.authors),
            _ => None,
        }
    }
}

/// Comparison key for a country name
pub fn fold_country(country: &str) -> String {
    country.to_lowercase()
}

/// True for placeholder countries ("Unknown", "missing", any casing)
pub fn is_sentinel(country: &str) -> bool {
    let folded = fold_country(country);
    SENTINEL_COUNTRIES.contains(&folded.as_str())
}
