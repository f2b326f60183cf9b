//! Display values for the per-country detail table

use crate::SampleRecord;
use serde::Serialize;

/// Placeholder shown for absent values
pub const NOT_AVAILABLE: &str = "N/A";

/// Sequence detail pages live under `{base}/seq/{accession}`
pub const DEFAULT_SEQUENCE_BASE_URL: &str = "https://pathoplexus.org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub accession: String,
    pub accession_url: String,
    pub collection_date: String,
    pub location: String,
    pub host: String,
    pub authors: String,
}

impl TableRow {
    pub fn from_record(record: &SampleRecord, base_url: &str) -> Self {
        let accession = record
            .accession_version
            .as_deref()
            .or(record.insdc_accession_full.as_deref());

        let location = [
            &record.geo_loc_country,
            &record.geo_loc_admin1,
            &record.geo_loc_admin2,
            &record.geo_loc_city,
        ]
        .iter()
        .filter_map(|part| part.as_deref())
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            accession: accession.unwrap_or(NOT_AVAILABLE).to_string(),
            accession_url: format!(
                "{}/seq/{}",
                base_url.trim_end_matches('/'),
                accession.unwrap_or("unknown")
            ),
            collection_date: or_na(&record.sample_collection_date),
            location: if location.is_empty() {
                NOT_AVAILABLE.to_string()
            } else {
                location
            },
            host: or_na(&record.host_name_scientific),
            authors: or_na(&record.authors),
        }
    }
}

fn or_na(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
