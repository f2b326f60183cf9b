//! Offline dataset summary written by `atlas-report`

use crate::FetchedDataset;
use geo_resolver::GeoResolver;
use geojson::FeatureCollection;
use sample_records::CountryTally;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReport {
    pub source: String,
    pub total_samples: usize,
    pub country_count: usize,
    /// Largest buckets first; ties keep first-seen order
    pub countries: Vec<CountryTally>,
    /// None when no geometry was supplied
    pub unmatched: Option<Vec<String>>,
    pub parse_warnings: usize,
}

impl DatasetReport {
    pub fn build(dataset: &FetchedDataset, geometry: Option<&FeatureCollection>) -> Self {
        let summary = dataset.summarize();

        let mut countries = summary.tallies();
        countries.sort_by(|a, b| b.count.cmp(&a.count));

        let unmatched = geometry.map(|g| GeoResolver::default().resolve(&summary, g).unmatched);

        Self {
            source: dataset.source.clone(),
            total_samples: summary.total_count(),
            country_count: summary.country_count(),
            countries,
            unmatched,
            parse_warnings: dataset.warnings.len(),
        }
    }

    pub fn top(&self, n: usize) -> &[CountryTally] {
        &self.countries[..n.min(self.countries.len())]
    }
}
