//! Per-country grouping of sample rows

use crate::{is_sentinel, SampleRecord, UNKNOWN_COUNTRY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Rows sharing one exact country value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryBucket {
    /// Country exactly as first seen in the data
    pub country: String,
    pub count: usize,
    /// Rows in ingestion order
    #[serde(rename = "data")]
    pub rows: Vec<SampleRecord>,
}

impl CountryBucket {
    pub fn tally(&self) -> CountryTally {
        CountryTally {
            country: self.country.clone(),
            count: self.count,
        }
    }
}

/// Bucket without its rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryTally {
    pub country: String,
    pub count: usize,
}

/// Ordered buckets for one dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountrySummary {
    buckets: Vec<CountryBucket>,
    total_count: usize,
}

impl CountrySummary {
    /// Buckets in first-seen order
    pub fn buckets(&self) -> &[CountryBucket] {
        &self.buckets
    }

    pub fn into_buckets(self) -> Vec<CountryBucket> {
        self.buckets
    }

    /// Number of rows across all buckets
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Number of buckets that name a real country
    pub fn country_count(&self) -> usize {
        self.buckets.iter().filter(|b| !is_sentinel(&b.country)).count()
    }

    /// Largest bucket count, 0 when empty
    pub fn max_count(&self) -> usize {
        self.buckets.iter().map(|b| b.count).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn tallies(&self) -> Vec<CountryTally> {
        self.buckets.iter().map(CountryBucket::tally).collect()
    }
}

/// Group rows by their exact country value.
///
/// Rows with no country go to the "Unknown" bucket. Buckets keep the order
/// in which each country was first seen.
pub fn aggregate(rows: impl IntoIterator<Item = SampleRecord>) -> CountrySummary {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<CountryBucket> = Vec::new();
    let mut total_count = 0;

    for row in rows {
        let country = row.country().unwrap_or(UNKNOWN_COUNTRY).to_string();
        let idx = match positions.get(&country) {
            Some(&idx) => idx,
            None => {
                positions.insert(country.clone(), buckets.len());
                buckets.push(CountryBucket {
                    country,
                    count: 0,
                    rows: Vec::new(),
                });
                buckets.len() - 1
            }
        };

        let bucket = &mut buckets[idx];
        bucket.rows.push(row);
        bucket.count += 1;
        total_count += 1;
    }

    debug!(
        "Aggregated {} rows into {} country buckets",
        total_count,
        buckets.len()
    );

    CountrySummary {
        buckets,
        total_count,
    }
}
