//! Case-insensitive country lookup over aggregated buckets

use sample_records::{fold_country, CountryBucket};
use std::collections::HashMap;
use tracing::debug;

/// Folded country name to bucket position.
///
/// Buckets whose names differ only in case collapse into one entry and the
/// later bucket wins. Counts are not merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryLookup {
    index: HashMap<String, usize>,
}

impl CountryLookup {
    pub fn build(buckets: &[CountryBucket]) -> Self {
        let mut index = HashMap::with_capacity(buckets.len());
        for (pos, bucket) in buckets.iter().enumerate() {
            if let Some(prev) = index.insert(fold_country(&bucket.country), pos) {
                debug!(
                    "Country '{}' shadows case variant '{}' in lookup",
                    bucket.country, buckets[prev].country
                );
            }
        }
        Self { index }
    }

    /// Bucket position for a name, compared case-insensitively
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&fold_country(name)).copied()
    }

    pub fn get<'a>(&self, buckets: &'a [CountryBucket], name: &str) -> Option<&'a CountryBucket> {
        self.position(name).and_then(|pos| buckets.get(pos))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&fold_country(name))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
