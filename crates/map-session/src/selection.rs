//! Hover and click state for the country map
//!
//! ```text
//!           pointer_enter(with data)           click(with data)
//!   Idle ───────────────────────────▶ Hovered ─────────────────▶ Selected
//!    ▲  ◀─────────── pointer_leave ────┘                            │
//!    └────────────────────────── reset(new summary) ◀───────────────┘
//! ```
//!
//! Hover and selection are independent. A selected country stays selected
//! when the pointer moves elsewhere, and a later click on another country
//! with data replaces it.
//!
//! Once map regions are attached, only names of regions drawn with data
//! respond. Without them any name with a bucket does.

use crate::paginator::TablePaginator;
use crate::table::{Popup, TablePage, EMPTY_TABLE_NOTICE};
use geo_resolver::{CountryLookup, RegionMatch};
use sample_records::{fold_country, CountryBucket, CountrySummary, SampleRecord, TableRow};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Serializable view of the controller's fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub hovered_country: Option<String>,
    pub selected_country: Option<String>,
    pub active_row_count: usize,
    pub current_page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selected {
    /// Name as clicked on the map
    name: String,
    /// Bucket the name resolved to
    bucket: usize,
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    summary: Arc<CountrySummary>,
    lookup: CountryLookup,
    /// Folded names of regions drawn with data
    on_map: Option<HashSet<String>>,
    hovered: Option<String>,
    selected: Option<Selected>,
    paginator: TablePaginator,
}

impl SelectionController {
    pub fn new(summary: Arc<CountrySummary>) -> Self {
        let lookup = CountryLookup::build(summary.buckets());
        Self {
            summary,
            lookup,
            on_map: None,
            hovered: None,
            selected: None,
            paginator: TablePaginator::default(),
        }
    }

    /// Restrict hover and click to regions resolved with data
    pub fn with_map_regions(mut self, regions: &[RegionMatch]) -> Self {
        let on_map: HashSet<String> = regions
            .iter()
            .filter(|r| r.has_data)
            .filter_map(|r| r.display_name.as_deref())
            .map(fold_country)
            .collect();
        debug!("{} map regions accept hover and click", on_map.len());
        self.on_map = Some(on_map);
        self
    }

    /// Swap in a new dataset and clear hover, selection and page
    pub fn reset(&mut self, summary: Arc<CountrySummary>) {
        *self = Self::new(summary);
    }

    pub fn summary(&self) -> &Arc<CountrySummary> {
        &self.summary
    }

    /// Bucket a map region name resolves to, if it has data
    pub fn bucket_for(&self, name: &str) -> Option<&CountryBucket> {
        self.lookup.get(self.summary.buckets(), name)
    }

    pub fn has_data(&self, name: &str) -> bool {
        let drawn = self
            .on_map
            .as_ref()
            .map_or(true, |regions| regions.contains(&fold_country(name)));
        drawn && self.lookup.contains(name)
    }

    /// Returns whether the hover took effect
    pub fn pointer_enter(&mut self, name: &str) -> bool {
        if !self.has_data(name) {
            return false;
        }
        self.hovered = Some(name.to_string());
        true
    }

    pub fn pointer_leave(&mut self) {
        self.hovered = None;
    }

    /// Select a region. Regions without data are ignored and leave the
    /// current selection in place.
    pub fn click(&mut self, name: &str) -> bool {
        let Some(bucket) = self.lookup.position(name).filter(|_| self.has_data(name)) else {
            debug!("Ignoring click on '{}': no samples", name);
            return false;
        };

        let rows = self.summary.buckets()[bucket].rows.len();
        self.selected = Some(Selected {
            name: name.to_string(),
            bucket,
        });
        self.paginator.reset(rows);

        debug!("Selected '{}' with {} rows", name, rows);
        true
    }

    pub fn hovered_country(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn selected_country(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.name.as_str())
    }

    /// Rows of the selected bucket, empty when nothing is selected
    pub fn active_rows(&self) -> &[SampleRecord] {
        self.selected
            .as_ref()
            .and_then(|s| self.summary.buckets().get(s.bucket))
            .map(|b| b.rows.as_slice())
            .unwrap_or(&[])
    }

    pub fn paginator(&self) -> &TablePaginator {
        &self.paginator
    }

    pub fn go_to_page(&mut self, n: usize) -> usize {
        self.paginator.go_to_page(n)
    }

    pub fn next_page(&mut self) -> usize {
        self.paginator.next()
    }

    pub fn previous_page(&mut self) -> usize {
        self.paginator.previous()
    }

    pub fn current_page_rows(&self) -> &[SampleRecord] {
        self.paginator.page_slice(self.active_rows())
    }

    /// Tooltip for the hovered country
    pub fn popup(&self) -> Option<Popup> {
        let name = self.hovered.as_deref()?;
        let bucket = self.bucket_for(name)?;
        Some(Popup::new(name, bucket.count))
    }

    pub fn popup_text(&self) -> Option<String> {
        self.popup().map(|p| p.text)
    }

    /// Current table page with rows rendered for display
    pub fn table_page(&self, sequence_base_url: &str) -> TablePage {
        let Some(country) = self.selected_country() else {
            return TablePage {
                notice: Some(EMPTY_TABLE_NOTICE.to_string()),
                ..TablePage::default()
            };
        };

        let total_rows = self.active_rows().len();
        let rows = self
            .current_page_rows()
            .iter()
            .map(|r| TableRow::from_record(r, sequence_base_url))
            .collect();

        TablePage {
            country: Some(country.to_string()),
            heading: Some(format!("Sequences from {} ({} total)", country, total_rows)),
            notice: None,
            rows,
            total_rows,
            page: self.paginator.current_page(),
            total_pages: self.paginator.total_pages(),
            page_window: self.paginator.page_window(),
            has_previous: self.paginator.has_previous(),
            has_next: self.paginator.has_next(),
        }
    }

    pub fn state(&self) -> SelectionState {
        SelectionState {
            hovered_country: self.hovered.clone(),
            selected_country: self.selected_country().map(str::to_string),
            active_row_count: self.active_rows().len(),
            current_page: self.paginator.current_page(),
        }
    }
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(Arc::new(CountrySummary::default()))
    }
}
